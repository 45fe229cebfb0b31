//! Late-fee payment endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::borrow::{Borrow, BorrowWithUser, FeeRecord, PaymentStatus, PaymentSummary},
};

use super::AuthenticatedUser;

/// Payment confirmation response
#[derive(Serialize, ToSchema)]
pub struct PaymentConfirmation {
    pub message: String,
    pub borrow_id: i32,
    pub fee_paid: i64,
    pub payment_status: PaymentStatus,
}

/// Pay a late fee
#[utoipa::path(
    post,
    path = "/payments/pay/{borrow_id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("borrow_id" = i32, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Payment successful", body = PaymentConfirmation),
        (status = 400, description = "Already paid or nothing to pay"),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Borrow not found")
    )
)]
pub async fn pay_late_fee(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(borrow_id): Path<i32>,
) -> AppResult<Json<PaymentConfirmation>> {
    let borrow = state
        .services
        .payments
        .process_payment(borrow_id, claims.user_id)
        .await?;

    Ok(Json(PaymentConfirmation {
        message: "Payment successful".to_string(),
        borrow_id,
        fee_paid: borrow.fee_applied,
        payment_status: borrow.payment_status,
    }))
}

/// The caller's unpaid fees, including live fines on unreturned overdue books
#[utoipa::path(
    get,
    path = "/payments/unpaid",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unpaid fees", body = Vec<Borrow>)
    )
)]
pub async fn unpaid_fees(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Borrow>>> {
    let unpaid = state.services.payments.unpaid_fees(claims.user_id).await?;
    Ok(Json(unpaid))
}

/// The caller's fee totals
#[utoipa::path(
    get,
    path = "/payments/summary",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fee summary", body = PaymentSummary)
    )
)]
pub async fn payment_summary(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<PaymentSummary>> {
    let summary = state.services.payments.summary(claims.user_id).await?;
    Ok(Json(summary))
}

#[derive(Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Filter by payment status: "paid" or "unpaid"
    pub status_filter: Option<String>,
}

fn parse_status(filter: Option<String>) -> AppResult<Option<PaymentStatus>> {
    filter
        .map(|s| {
            s.parse::<PaymentStatus>()
                .map_err(AppError::Validation)
        })
        .transpose()
}

/// The caller's fee history
#[utoipa::path(
    get,
    path = "/payments/history",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(HistoryQuery),
    responses(
        (status = 200, description = "Fee history", body = Vec<FeeRecord>)
    )
)]
pub async fn payment_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<FeeRecord>>> {
    let status = parse_status(query.status_filter)?;
    let history = state.services.payments.history(claims.user_id, status).await?;
    Ok(Json(history))
}

/// Fee totals across all borrowers (librarian only)
#[utoipa::path(
    get,
    path = "/payments/all-summary",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fee summary for all borrowers", body = PaymentSummary),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn all_payment_summary(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<PaymentSummary>> {
    claims.require_elevated()?;

    let summary = state.services.payments.all_summary().await?;
    Ok(Json(summary))
}

/// Unpaid fees across all borrowers (librarian only)
#[utoipa::path(
    get,
    path = "/payments/all-unpaid",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unpaid fees for all borrowers", body = Vec<BorrowWithUser>),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn all_unpaid_fees(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowWithUser>>> {
    claims.require_elevated()?;

    let unpaid = state.services.payments.all_unpaid_fees().await?;
    Ok(Json(unpaid))
}

#[derive(Deserialize, IntoParams)]
pub struct AllHistoryQuery {
    /// Filter by payment status: "paid" or "unpaid"
    pub status_filter: Option<String>,
    /// Maximum number of records to return (1-500, default 100)
    pub limit: Option<i64>,
}

/// Fee history across all borrowers (librarian only)
#[utoipa::path(
    get,
    path = "/payments/all-history",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(AllHistoryQuery),
    responses(
        (status = 200, description = "Fee history for all borrowers", body = Vec<FeeRecord>),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn all_payment_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AllHistoryQuery>,
) -> AppResult<Json<Vec<FeeRecord>>> {
    claims.require_elevated()?;

    let status = parse_status(query.status_filter)?;
    let limit = query.limit.unwrap_or(100).clamp(1, 500);

    let history = state.services.payments.all_history(status, limit).await?;
    Ok(Json(history))
}
