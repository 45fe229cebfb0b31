//! Books repository: catalog rows and the availability ledger

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult, InvalidStateKind},
    models::book::{Book, CreateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let copies = book.total_copies.unwrap_or(1).max(0);

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, total_copies, available_copies, description)
            VALUES ($1, $2, $3, $4, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(copies)
        .bind(&book.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Add copies to both the total and available counts
    pub async fn restock(&self, id: i32, additional_copies: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET total_copies = total_copies + $2,
                available_copies = available_copies + $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(additional_copies)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a book. Rejected while any active borrow references it, so the
    /// ledger can never point at a missing row.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;

        let active_borrows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrows WHERE book_id = $1 AND returned_at IS NULL",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if active_borrows > 0 {
            return Err(AppError::InvalidState(
                InvalidStateKind::BookHasActiveBorrows,
                format!("Book has {} active borrows and cannot be deleted", active_borrows),
            ));
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Take one copy off the shelf. The availability check and the decrement
    /// are a single conditional update, so two concurrent borrows of the last
    /// copy serialize on the row: exactly one sees `true`.
    pub async fn checkout_copy(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Put one copy back on the shelf. At `total_copies` the increment is
    /// skipped rather than failed; returns whether a copy was released.
    pub async fn release_copy(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
