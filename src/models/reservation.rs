//! Reservation model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Reservation model from database.
///
/// `notified` transitions false -> true exactly once, when a returned copy
/// is allocated to this reservation during a drain; it never reverts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub created_at: DateTime<Utc>,
    pub notified: bool,
}

/// Reservation request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReservationRequest {
    pub book_id: i32,
}

/// Pending reservation joined with reserver identity, for listings and drain
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReservationWithUser {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub username: String,
    pub full_name: Option<String>,
}

/// Paged pending-reservation listing
#[derive(Debug, Serialize, ToSchema)]
pub struct PagedReservations {
    pub items: Vec<ReservationWithUser>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}
