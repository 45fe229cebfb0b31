//! Durable notification store

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::notification::{Notification, NotificationKind},
};

#[derive(Clone)]
pub struct NotificationsRepository {
    pool: Pool<Postgres>,
}

impl NotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append a notification record; the BIGSERIAL id is the monotonic
    /// ordering the bus exposes
    pub async fn insert(
        &self,
        user_id: i32,
        kind: NotificationKind,
        data: serde_json::Value,
    ) -> AppResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, data, read, created_at)
            VALUES ($1, $2, $3, FALSE, NOW())
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Get a notification by id
    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Notification>> {
        let notification =
            sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(notification)
    }

    /// All unread records for a user, oldest first
    pub async fn list_unread(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 AND read = FALSE ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Idempotently mark a record read; false when the id is unknown
    pub async fn mark_read(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
