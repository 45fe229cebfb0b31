//! Borrow and return endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::borrow::{Borrow, BorrowRequest, BorrowWithUser, OverdueBorrow},
};

use super::AuthenticatedUser;

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = Borrow),
        (status = 400, description = "No copies available or borrow limit reached"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<Borrow>)> {
    let borrow = state
        .services
        .circulation
        .borrow(claims.user_id, request.book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(borrow)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrows/return/{borrow_id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("borrow_id" = i32, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = Borrow),
        (status = 400, description = "Already returned"),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Borrow not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(borrow_id): Path<i32>,
) -> AppResult<Json<Borrow>> {
    let borrow = state
        .services
        .circulation
        .return_book(borrow_id, claims.user_id)
        .await?;

    Ok(Json(borrow))
}

#[derive(Deserialize, IntoParams)]
pub struct MyBorrowsQuery {
    /// Include returned borrows (history); defaults to false
    pub include_returned: Option<bool>,
}

/// The caller's borrows
#[utoipa::path(
    get,
    path = "/borrows/me",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(MyBorrowsQuery),
    responses(
        (status = 200, description = "The caller's borrows", body = Vec<Borrow>)
    )
)]
pub async fn my_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MyBorrowsQuery>,
) -> AppResult<Json<Vec<Borrow>>> {
    let borrows = state
        .services
        .circulation
        .list_for_user(claims.user_id, query.include_returned.unwrap_or(false))
        .await?;

    Ok(Json(borrows))
}

/// All overdue borrows with the live-computed fine
#[utoipa::path(
    get,
    path = "/borrows/overdue",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue borrows with live fees", body = Vec<OverdueBorrow>),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn overdue_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<OverdueBorrow>>> {
    claims.require_elevated()?;

    let overdue = state.services.circulation.list_overdue().await?;
    Ok(Json(overdue))
}

#[derive(Deserialize, IntoParams)]
pub struct AllBorrowsQuery {
    /// Filter from this date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Filter until this date (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Include returned borrows; defaults to true
    pub include_returned: Option<bool>,
}

fn parse_day(value: &str, field: &str) -> AppResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid {} format. Use YYYY-MM-DD", field)))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// All borrow records with borrower identity (librarian only)
#[utoipa::path(
    get,
    path = "/borrows/all",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(AllBorrowsQuery),
    responses(
        (status = 200, description = "All borrows", body = Vec<BorrowWithUser>),
        (status = 400, description = "Invalid date filter"),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn all_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AllBorrowsQuery>,
) -> AppResult<Json<Vec<BorrowWithUser>>> {
    claims.require_elevated()?;

    let start = query
        .start_date
        .as_deref()
        .map(|s| parse_day(s, "start_date"))
        .transpose()?;
    let end = query
        .end_date
        .as_deref()
        .map(|s| parse_day(s, "end_date"))
        .transpose()?;

    let borrows = state
        .services
        .circulation
        .list_all(start, end, query.include_returned.unwrap_or(true))
        .await?;

    Ok(Json(borrows))
}
