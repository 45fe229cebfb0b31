//! Notification endpoints: polling, mark-read, and live streaming
//!
//! The streaming endpoints cannot carry an Authorization header (browser
//! EventSource and WebSocket clients), so they accept the session token as a
//! `?token=` query parameter or an `access_token` cookie.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tokio_stream::{Stream, StreamExt};
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::notification::{MarkReadRequest, MarkReadResponse, NotificationList},
    services::notifications::{MarkReadStatus, Subscription},
};

use super::{stream_claims, AuthenticatedUser};

/// Unread notifications for the caller
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unread notifications", body = NotificationList)
    )
)]
pub async fn list_notifications(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<NotificationList>> {
    let items = state.services.notifications.list_unread(claims.user_id).await?;
    let count = items.len();

    Ok(Json(NotificationList { items, count }))
}

/// Mark a notification as read. Misses are reported softly in the body.
#[utoipa::path(
    post,
    path = "/notifications/mark-read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Mark-read outcome", body = MarkReadResponse)
    )
)]
pub async fn mark_read(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<MarkReadRequest>,
) -> AppResult<Json<MarkReadResponse>> {
    let status = state
        .services
        .notifications
        .mark_read(request.id, claims.user_id)
        .await?;

    let response = match status {
        MarkReadStatus::Marked => MarkReadResponse {
            ok: true,
            message: None,
        },
        MarkReadStatus::NotFound => MarkReadResponse {
            ok: false,
            message: Some("not found".to_string()),
        },
        MarkReadStatus::NotOwner => MarkReadResponse {
            ok: false,
            message: Some("not allowed".to_string()),
        },
    };

    Ok(Json(response))
}

#[derive(Deserialize, IntoParams)]
pub struct StreamQuery {
    /// Session token; falls back to the `access_token` cookie
    pub token: Option<String>,
}

/// SSE stream of the caller's notifications
#[utoipa::path(
    get,
    path = "/notifications/stream",
    tag = "notifications",
    params(StreamQuery),
    responses(
        (status = 200, description = "Server-sent event stream"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn stream_notifications(
    State(state): State<crate::AppState>,
    Query(query): Query<StreamQuery>,
    jar: CookieJar,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let claims = stream_claims(&state, query.token, &jar)?;

    let subscription = state.services.notifications.subscribe(claims.user_id);
    let stream = subscription.map(|n| Event::default().event("notification").json_data(n));

    let keepalive = KeepAlive::new()
        .interval(Duration::from_secs(state.config.notifications.sse_keepalive_secs))
        .text("ping");

    Ok(Sse::new(stream).keep_alive(keepalive))
}

/// WebSocket stream of the caller's notifications
#[utoipa::path(
    get,
    path = "/notifications/ws",
    tag = "notifications",
    params(StreamQuery),
    responses(
        (status = 101, description = "WebSocket upgrade"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn websocket_notifications(
    State(state): State<crate::AppState>,
    Query(query): Query<StreamQuery>,
    jar: CookieJar,
    ws: WebSocketUpgrade,
) -> Response {
    let claims = match stream_claims(&state, query.token, &jar) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    let subscription = state.services.notifications.subscribe(claims.user_id);
    let ping_interval = Duration::from_secs(state.config.notifications.ws_ping_secs);

    ws.on_upgrade(move |socket| serve_socket(socket, subscription, ping_interval))
}

/// Pump notifications to the socket. A wait that times out emits a ping, so
/// the connection stays verifiably alive and a disconnected client surfaces
/// as a send error. Dropping the subscription on exit removes the live
/// buffer from the hub.
async fn serve_socket(mut socket: WebSocket, mut subscription: Subscription, ping: Duration) {
    loop {
        match tokio::time::timeout(ping, subscription.recv()).await {
            Ok(Some(notification)) => {
                let payload = match serde_json::to_string(&notification) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to serialize notification");
                        continue;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => {
                if socket.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}
