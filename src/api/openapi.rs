//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrows, health, notifications, payments, reservations};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblion API",
        version = "0.3.0",
        description = "Library Circulation Backend REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API root")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Borrows
        borrows::borrow_book,
        borrows::return_book,
        borrows::my_borrows,
        borrows::overdue_borrows,
        borrows::all_borrows,
        // Payments
        payments::pay_late_fee,
        payments::unpaid_fees,
        payments::payment_summary,
        payments::payment_history,
        payments::all_payment_summary,
        payments::all_unpaid_fees,
        payments::all_payment_history,
        // Reservations
        reservations::create_reservation,
        reservations::list_reservations,
        reservations::get_reservation,
        reservations::cancel_reservation,
        // Notifications
        notifications::list_notifications,
        notifications::mark_read,
        notifications::stream_notifications,
        notifications::websocket_notifications,
        // Catalog
        books::get_book,
        books::create_book,
        books::restock_book,
        books::delete_book,
    ),
    components(
        schemas(
            // Catalog
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::RestockBook,
            // Borrows
            crate::models::borrow::Borrow,
            crate::models::borrow::BorrowRequest,
            crate::models::borrow::BorrowWithUser,
            crate::models::borrow::OverdueBorrow,
            crate::models::borrow::PaymentStatus,
            crate::models::borrow::PaymentSummary,
            crate::models::borrow::FeeRecord,
            payments::PaymentConfirmation,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationRequest,
            crate::models::reservation::ReservationWithUser,
            crate::models::reservation::PagedReservations,
            reservations::CancelResponse,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::NotificationKind,
            crate::models::notification::NotificationList,
            crate::models::notification::MarkReadRequest,
            crate::models::notification::MarkReadResponse,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "borrows", description = "Borrow and return workflow"),
        (name = "payments", description = "Late-fee payments"),
        (name = "reservations", description = "Reservation queue"),
        (name = "notifications", description = "Notification delivery"),
        (name = "books", description = "Catalog mutation")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
