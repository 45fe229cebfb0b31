//! Error types for Biblion server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable application error codes reported alongside the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchBook = 5,
    NoCopiesAvailable = 6,
    MaxBorrowsReached = 7,
    AlreadyReturned = 8,
    AlreadyPaid = 9,
    NothingToPay = 10,
    AlreadyReserved = 11,
    StillAvailable = 12,
    BookHasActiveBorrows = 13,
    BadValue = 14,
    NoSuchData = 15,
}

/// Which circulation-state rule was violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidStateKind {
    AlreadyReturned,
    AlreadyPaid,
    NothingToPay,
    AlreadyReserved,
    StillAvailable,
    BookHasActiveBorrows,
}

impl InvalidStateKind {
    fn code(self) -> ErrorCode {
        match self {
            InvalidStateKind::AlreadyReturned => ErrorCode::AlreadyReturned,
            InvalidStateKind::AlreadyPaid => ErrorCode::AlreadyPaid,
            InvalidStateKind::NothingToPay => ErrorCode::NothingToPay,
            InvalidStateKind::AlreadyReserved => ErrorCode::AlreadyReserved,
            InvalidStateKind::StillAvailable => ErrorCode::StillAvailable,
            InvalidStateKind::BookHasActiveBorrows => ErrorCode::BookHasActiveBorrows,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Borrow precondition: no copies left on the shelf
    #[error("No copies available: {0}")]
    Unavailable(String),

    /// Borrow precondition: the user's active-borrow cap is met
    #[error("Borrow limit exceeded: {0}")]
    LimitExceeded(String),

    /// Already returned, already paid, nothing to pay, still available, ...
    #[error("Invalid state: {1}")]
    InvalidState(InvalidStateKind, String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    /// HTTP status and stable code for this error
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Unavailable(_) => (StatusCode::BAD_REQUEST, ErrorCode::NoCopiesAvailable),
            AppError::LimitExceeded(_) => (StatusCode::BAD_REQUEST, ErrorCode::MaxBorrowsReached),
            AppError::InvalidState(kind, _) => (StatusCode::BAD_REQUEST, kind.code()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Unavailable(msg)
            | AppError::LimitExceeded(msg)
            | AppError::InvalidState(_, msg)
            | AppError::BadRequest(msg) => msg.clone(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_errors_map_to_bad_request() {
        let cases = [
            AppError::Unavailable("no copies".into()),
            AppError::LimitExceeded("cap met".into()),
            AppError::InvalidState(InvalidStateKind::AlreadyReturned, "returned".into()),
            AppError::InvalidState(InvalidStateKind::NothingToPay, "no fee".into()),
            AppError::InvalidState(InvalidStateKind::StillAvailable, "available".into()),
        ];
        for err in cases {
            let (status, _) = err.status_and_code();
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn ownership_and_absence_statuses() {
        let (status, code) = AppError::Authorization("not yours".into()).status_and_code();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code, ErrorCode::NotAuthorized);

        let (status, _) = AppError::NotFound("borrow 9 not found".into()).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
