//! Book (catalog) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book model from database.
///
/// Invariant: `0 <= available_copies <= total_copies`, maintained by the
/// guarded ledger updates in the books repository.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub description: Option<String>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10-17 characters"))]
    pub isbn: String,
    /// Number of copies added to the shelf (defaults to 1)
    pub total_copies: Option<i32>,
    pub description: Option<String>,
}

/// Restock request: adds copies to both total and available counts
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RestockBook {
    #[validate(range(min = 1, message = "additional_copies must be positive"))]
    pub additional_copies: i32,
}
