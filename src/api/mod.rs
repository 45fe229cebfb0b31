//! API handlers for Biblion REST endpoints

pub mod books;
pub mod borrows;
pub mod health;
pub mod notifications;
pub mod openapi;
pub mod payments;
pub mod reservations;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        // Check for Bearer token
        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::Authentication("Invalid authorization header format".to_string()));
        }

        let token = &auth_header[7..];

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Resolve claims for streaming endpoints, which cannot carry an
/// Authorization header: the token arrives as a `?token=` query parameter or
/// an `access_token` cookie.
pub(crate) fn stream_claims(
    state: &AppState,
    token: Option<String>,
    jar: &CookieJar,
) -> Result<UserClaims, AppError> {
    let token = token
        .or_else(|| jar.get("access_token").map(|c| c.value().to_string()))
        .ok_or_else(|| AppError::Authentication("Missing token".to_string()))?;

    UserClaims::from_token(&token, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Authentication(e.to_string()))
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Borrows
        .route("/borrows", post(borrows::borrow_book))
        .route("/borrows/return/:borrow_id", post(borrows::return_book))
        .route("/borrows/me", get(borrows::my_borrows))
        .route("/borrows/overdue", get(borrows::overdue_borrows))
        .route("/borrows/all", get(borrows::all_borrows))
        // Payments
        .route("/payments/pay/:borrow_id", post(payments::pay_late_fee))
        .route("/payments/unpaid", get(payments::unpaid_fees))
        .route("/payments/summary", get(payments::payment_summary))
        .route("/payments/history", get(payments::payment_history))
        .route("/payments/all-summary", get(payments::all_payment_summary))
        .route("/payments/all-unpaid", get(payments::all_unpaid_fees))
        .route("/payments/all-history", get(payments::all_payment_history))
        // Reservations
        .route("/reservations", post(reservations::create_reservation))
        .route("/reservations", get(reservations::list_reservations))
        .route("/reservations/:id", get(reservations::get_reservation))
        .route("/reservations/:id", delete(reservations::cancel_reservation))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/mark-read", post(notifications::mark_read))
        .route("/notifications/stream", get(notifications::stream_notifications))
        .route("/notifications/ws", get(notifications::websocket_notifications))
        // Catalog
        .route("/books", post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id", delete(books::delete_book))
        .route("/books/:id/restock", post(books::restock_book))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
