//! Borrow (circulation) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use super::user::Role;

/// Late-fee payment state, orthogonal to the active/returned transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

// SQLx conversion for PaymentStatus (stored as TEXT)
impl sqlx::Type<Postgres> for PaymentStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for PaymentStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for PaymentStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Borrow model from database.
///
/// Active while `returned_at` is null; overdue while active and
/// `due_date < now`. `fee_applied` is set once, at return time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub fee_applied: i64,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Borrow {
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Borrow request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub book_id: i32,
}

/// Overdue borrow with borrower identity and the live-computed fine
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverdueBorrow {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub book_id: i32,
    pub book_title: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub hours_overdue: i64,
    pub current_fee: i64,
    pub fee_applied: i64,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Borrow joined with borrower identity, for librarian views
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowWithUser {
    #[serde(flatten)]
    pub borrow: Borrow,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
}

/// Fee history entry: a borrow with a fee, plus optional borrower/book context
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeeRecord {
    #[serde(flatten)]
    pub borrow: Borrow,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub book_title: Option<String>,
}

/// Aggregate fee totals for a user (or, librarian view, for all borrowers)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentSummary {
    pub total_unpaid: i64,
    pub total_paid: i64,
    pub count_unpaid: i64,
    pub count_paid: i64,
}
