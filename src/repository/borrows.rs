//! Borrows repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{Borrow, BorrowWithUser},
        user::Role,
    },
};

/// An overdue borrow joined with borrower identity and book title
#[derive(Debug, Clone)]
pub struct OverdueRow {
    pub borrow: Borrow,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub book_title: String,
}

pub(crate) fn borrow_from_row(row: &PgRow) -> Borrow {
    Borrow {
        id: row.get("id"),
        user_id: row.get("user_id"),
        book_id: row.get("book_id"),
        borrowed_at: row.get("borrowed_at"),
        due_date: row.get("due_date"),
        returned_at: row.get("returned_at"),
        fee_applied: row.get("fee_applied"),
        payment_status: row.get("payment_status"),
        paid_at: row.get("paid_at"),
    }
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrow> {
        sqlx::query_as::<_, Borrow>("SELECT * FROM borrows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow record {} not found", id)))
    }

    /// Get borrow by ID, locking the row for the rest of the transaction.
    /// Serializes concurrent returns/payments of the same borrow.
    pub async fn lock_by_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<Borrow> {
        sqlx::query_as::<_, Borrow>("SELECT * FROM borrows WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow record {} not found", id)))
    }

    /// Insert a new borrow, in the same transaction as the ledger decrement
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        book_id: i32,
        borrowed_at: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> AppResult<Borrow> {
        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (user_id, book_id, borrowed_at, due_date, fee_applied, payment_status)
            VALUES ($1, $2, $3, $4, 0, 'unpaid')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(borrowed_at)
        .bind(due_date)
        .fetch_one(&mut **tx)
        .await?;

        Ok(borrow)
    }

    /// Set `returned_at` and the fee computed at return time
    pub async fn mark_returned(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
        returned_at: DateTime<Utc>,
        fee_applied: i64,
    ) -> AppResult<Borrow> {
        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows
            SET returned_at = $2, fee_applied = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(returned_at)
        .bind(fee_applied)
        .fetch_one(&mut **tx)
        .await?;

        Ok(borrow)
    }

    /// Mark the late fee as paid
    pub async fn mark_paid(&self, id: i32, paid_at: DateTime<Utc>) -> AppResult<Borrow> {
        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows
            SET payment_status = 'paid', paid_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(paid_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(borrow)
    }

    /// Number of active borrows held by a user
    pub async fn count_active_for_user(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrows WHERE user_id = $1 AND returned_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Borrows for a user, optionally including returned history
    pub async fn list_for_user(
        &self,
        user_id: i32,
        include_returned: bool,
    ) -> AppResult<Vec<Borrow>> {
        let query = if include_returned {
            "SELECT * FROM borrows WHERE user_id = $1 ORDER BY borrowed_at DESC"
        } else {
            "SELECT * FROM borrows WHERE user_id = $1 AND returned_at IS NULL ORDER BY borrowed_at DESC"
        };

        let borrows = sqlx::query_as::<_, Borrow>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(borrows)
    }

    /// All borrows with borrower identity, filtered by borrow date range
    pub async fn list_all(
        &self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        include_returned: bool,
    ) -> AppResult<Vec<BorrowWithUser>> {
        let mut conditions = Vec::new();
        if !include_returned {
            conditions.push("b.returned_at IS NULL".to_string());
        }
        if start_date.is_some() {
            conditions.push("b.borrowed_at >= $1".to_string());
        }
        if end_date.is_some() {
            let i = if start_date.is_some() { 2 } else { 1 };
            conditions.push(format!("b.borrowed_at <= ${}", i));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT b.*, u.username, u.full_name, u.role
            FROM borrows b
            JOIN users u ON u.id = b.user_id
            {}
            ORDER BY b.borrowed_at DESC
            "#,
            where_clause
        );

        let mut query = sqlx::query(&sql);
        if let Some(start) = start_date {
            query = query.bind(start);
        }
        if let Some(end) = end_date {
            query = query.bind(end);
        }

        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| BorrowWithUser {
                borrow: borrow_from_row(row),
                username: row.get("username"),
                full_name: row.get("full_name"),
                role: row.get("role"),
            })
            .collect())
    }

    /// Active borrows past their due date, with borrower and book context.
    /// Used by both the overdue endpoint and the overdue scanner.
    pub async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<OverdueRow>> {
        let rows = sqlx::query(
            r#"
            SELECT b.*, u.username, u.full_name, u.role, bk.title AS book_title
            FROM borrows b
            JOIN users u ON u.id = b.user_id
            JOIN books bk ON bk.id = b.book_id
            WHERE b.returned_at IS NULL AND b.due_date < $1
            ORDER BY b.due_date
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| OverdueRow {
                borrow: borrow_from_row(row),
                username: row.get("username"),
                full_name: row.get("full_name"),
                role: row.get("role"),
                book_title: row.get("book_title"),
            })
            .collect())
    }
}
