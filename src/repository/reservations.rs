//! Reservations repository for database operations

use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::reservation::{Reservation, ReservationWithUser},
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation {} not found", id)))
    }

    /// Create a new, un-notified reservation
    pub async fn create(&self, user_id: i32, book_id: i32) -> AppResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (user_id, book_id, created_at, notified)
            VALUES ($1, $2, NOW(), FALSE)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(reservation)
    }

    /// The user's pending (un-notified) reservation for a book, if any
    pub async fn find_pending(
        &self,
        user_id: i32,
        book_id: i32,
    ) -> AppResult<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = $1 AND book_id = $2 AND notified = FALSE",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reservation)
    }

    /// Pending reservations for a book, oldest first — the drain order
    pub async fn pending_for_book(&self, book_id: i32) -> AppResult<Vec<ReservationWithUser>> {
        let rows = sqlx::query(
            r#"
            SELECT r.*, u.username, u.full_name
            FROM reservations r
            JOIN users u ON u.id = r.user_id
            WHERE r.book_id = $1 AND r.notified = FALSE
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(reservation_with_user_from_row).collect())
    }

    /// Paged pending reservations, optionally filtered by book, oldest first
    pub async fn list_pending(
        &self,
        book_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<ReservationWithUser>, i64)> {
        let (count_sql, list_sql) = match book_id {
            Some(_) => (
                "SELECT COUNT(*) FROM reservations WHERE notified = FALSE AND book_id = $1",
                r#"
                SELECT r.*, u.username, u.full_name
                FROM reservations r
                JOIN users u ON u.id = r.user_id
                WHERE r.notified = FALSE AND r.book_id = $1
                ORDER BY r.created_at ASC
                OFFSET $2 LIMIT $3
                "#,
            ),
            None => (
                "SELECT COUNT(*) FROM reservations WHERE notified = FALSE",
                r#"
                SELECT r.*, u.username, u.full_name
                FROM reservations r
                JOIN users u ON u.id = r.user_id
                WHERE r.notified = FALSE
                ORDER BY r.created_at ASC
                OFFSET $1 LIMIT $2
                "#,
            ),
        };

        let total: i64 = match book_id {
            Some(id) => {
                sqlx::query_scalar(count_sql)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => sqlx::query_scalar(count_sql).fetch_one(&self.pool).await?,
        };

        let mut query = sqlx::query(list_sql);
        if let Some(id) = book_id {
            query = query.bind(id);
        }
        query = query.bind(offset).bind(limit);

        let rows = query.fetch_all(&self.pool).await?;

        Ok((
            rows.iter().map(reservation_with_user_from_row).collect(),
            total,
        ))
    }

    /// Flip the one-way notified flag
    pub async fn mark_notified(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE reservations SET notified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Cancel (delete) a reservation
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn reservation_with_user_from_row(row: &sqlx::postgres::PgRow) -> ReservationWithUser {
    ReservationWithUser {
        reservation: Reservation {
            id: row.get("id"),
            user_id: row.get("user_id"),
            book_id: row.get("book_id"),
            created_at: row.get("created_at"),
            notified: row.get("notified"),
        },
        username: row.get("username"),
        full_name: row.get("full_name"),
    }
}
