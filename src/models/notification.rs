//! Notification record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Kinds of notification emitted by the circulation workflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Borrowed,
    Returned,
    BookAvailable,
    Overdue,
    OverdueLibrarian,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Borrowed => "borrowed",
            NotificationKind::Returned => "returned",
            NotificationKind::BookAvailable => "book_available",
            NotificationKind::Overdue => "overdue",
            NotificationKind::OverdueLibrarian => "overdue_librarian",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable notification record.
///
/// The id is a monotonic BIGSERIAL; records are appended, marked read, and
/// never deleted. Live subscriptions receive a non-durable copy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i64,
    pub user_id: i32,
    pub kind: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Unread-notification listing for a user
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationList {
    pub items: Vec<Notification>,
    pub count: usize,
}

/// Mark-read request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkReadRequest {
    pub id: i64,
}

/// Mark-read response; failures are reported softly, not as HTTP errors
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
