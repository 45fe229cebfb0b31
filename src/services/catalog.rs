//! Catalog service: the Book lifecycle circulation depends on

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        self.repository.books.create(book).await
    }

    /// Add copies to both the total and available counts
    pub async fn restock(&self, id: i32, additional_copies: i32) -> AppResult<Book> {
        self.repository.books.restock(id, additional_copies).await
    }

    /// Delete a book; rejected while any active borrow references it
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }
}
