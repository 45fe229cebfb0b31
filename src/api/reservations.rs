//! Reservation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::reservation::{PagedReservations, Reservation, ReservationRequest},
};

use super::AuthenticatedUser;

/// Reserve a book for the caller. Only allowed while no copies are available.
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = ReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 400, description = "Already reserved or book still available"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ReservationRequest>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let reservation = state
        .services
        .reservations
        .reserve(claims.user_id, request.book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

#[derive(Deserialize, IntoParams)]
pub struct ReservationsQuery {
    /// Optional filter by book
    pub book_id: Option<i32>,
    /// Page number (default 1)
    pub page: Option<i64>,
    /// Page size (1-500, default 50)
    pub page_size: Option<i64>,
}

/// List pending reservations, oldest first
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(ReservationsQuery),
    responses(
        (status = 200, description = "Pending reservations", body = PagedReservations)
    )
)]
pub async fn list_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ReservationsQuery>,
) -> AppResult<Json<PagedReservations>> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(50).clamp(1, 500);

    let listing = state
        .services
        .reservations
        .list_pending(query.book_id, page, page_size)
        .await?;

    Ok(Json(listing))
}

/// Get a reservation (owner or librarian)
#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation", body = Reservation),
        (status = 403, description = "Not the reserver"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.services.reservations.get(id).await?;

    if !claims.is_elevated() && claims.user_id != reservation.user_id {
        return Err(AppError::Authorization("Permission denied".to_string()));
    }

    Ok(Json(reservation))
}

/// Cancellation confirmation
#[derive(Serialize, ToSchema)]
pub struct CancelResponse {
    pub status: String,
}

/// Cancel a reservation (owner or librarian)
#[utoipa::path(
    delete,
    path = "/reservations/{id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation cancelled", body = CancelResponse),
        (status = 403, description = "Not the reserver"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn cancel_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<CancelResponse>> {
    let reservation = state.services.reservations.get(id).await?;

    if !claims.is_elevated() && claims.user_id != reservation.user_id {
        return Err(AppError::Authorization("Permission denied".to_string()));
    }

    state.services.reservations.cancel(id).await?;

    Ok(Json(CancelResponse {
        status: "cancelled".to_string(),
    }))
}
