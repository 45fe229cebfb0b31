//! Fee and payment queries over the borrows table

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::borrow::{Borrow, BorrowWithUser, FeeRecord, PaymentStatus},
};

use super::borrows::borrow_from_row;

#[derive(Clone)]
pub struct PaymentsRepository {
    pool: Pool<Postgres>,
}

impl PaymentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Returned borrows of a user with an unpaid fee on record
    pub async fn list_unpaid_returned(&self, user_id: i32) -> AppResult<Vec<Borrow>> {
        let borrows = sqlx::query_as::<_, Borrow>(
            r#"
            SELECT * FROM borrows
            WHERE user_id = $1
              AND fee_applied > 0
              AND payment_status = 'unpaid'
              AND returned_at IS NOT NULL
            ORDER BY returned_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrows)
    }

    /// Unreturned borrows of a user already past their due date; the caller
    /// computes the live fee for display
    pub async fn list_overdue_active(
        &self,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Borrow>> {
        let borrows = sqlx::query_as::<_, Borrow>(
            r#"
            SELECT * FROM borrows
            WHERE user_id = $1 AND returned_at IS NULL AND due_date < $2
            ORDER BY due_date
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrows)
    }

    /// Fee history for a user: every borrow with a fee, joined with the book
    /// title, newest first
    pub async fn list_fees(
        &self,
        user_id: i32,
        status: Option<PaymentStatus>,
    ) -> AppResult<Vec<FeeRecord>> {
        let sql = match status {
            Some(_) => {
                r#"
                SELECT b.*, bk.title AS book_title
                FROM borrows b
                LEFT JOIN books bk ON bk.id = b.book_id
                WHERE b.user_id = $1 AND b.fee_applied > 0 AND b.payment_status = $2
                ORDER BY b.borrowed_at DESC
                "#
            }
            None => {
                r#"
                SELECT b.*, bk.title AS book_title
                FROM borrows b
                LEFT JOIN books bk ON bk.id = b.book_id
                WHERE b.user_id = $1 AND b.fee_applied > 0
                ORDER BY b.borrowed_at DESC
                "#
            }
        };

        let mut query = sqlx::query(sql).bind(user_id);
        if let Some(status) = status {
            query = query.bind(status);
        }

        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| FeeRecord {
                borrow: borrow_from_row(row),
                username: None,
                full_name: None,
                role: None,
                book_title: row.get("book_title"),
            })
            .collect())
    }

    /// Returned borrows with unpaid fees across all borrowers
    /// (student/faculty accounts only)
    pub async fn list_all_unpaid_returned(&self) -> AppResult<Vec<BorrowWithUser>> {
        let rows = sqlx::query(
            r#"
            SELECT b.*, u.username, u.full_name, u.role
            FROM borrows b
            JOIN users u ON u.id = b.user_id
            WHERE b.fee_applied > 0
              AND b.payment_status = 'unpaid'
              AND b.returned_at IS NOT NULL
              AND u.role IN ('student', 'faculty')
            ORDER BY b.returned_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(borrow_with_user_from_row).collect())
    }

    /// Unreturned overdue borrows across all borrowers
    /// (student/faculty accounts only)
    pub async fn list_all_overdue_active(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<BorrowWithUser>> {
        let rows = sqlx::query(
            r#"
            SELECT b.*, u.username, u.full_name, u.role
            FROM borrows b
            JOIN users u ON u.id = b.user_id
            WHERE b.returned_at IS NULL
              AND b.due_date < $1
              AND u.role IN ('student', 'faculty')
            ORDER BY b.due_date
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(borrow_with_user_from_row).collect())
    }

    /// Paid fees across all borrowers (student/faculty accounts only)
    pub async fn list_all_paid(&self) -> AppResult<Vec<BorrowWithUser>> {
        let rows = sqlx::query(
            r#"
            SELECT b.*, u.username, u.full_name, u.role
            FROM borrows b
            JOIN users u ON u.id = b.user_id
            WHERE b.fee_applied > 0
              AND b.payment_status = 'paid'
              AND u.role IN ('student', 'faculty')
            ORDER BY b.paid_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(borrow_with_user_from_row).collect())
    }

    /// Paid fees for a user, most recent payment first
    pub async fn list_paid(&self, user_id: i32) -> AppResult<Vec<Borrow>> {
        let borrows = sqlx::query_as::<_, Borrow>(
            r#"
            SELECT * FROM borrows
            WHERE user_id = $1 AND fee_applied > 0 AND payment_status = 'paid'
            ORDER BY paid_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrows)
    }

    /// Fee history across all borrowers with user and book context
    /// (student/faculty accounts only)
    pub async fn list_all_fees(
        &self,
        status: Option<PaymentStatus>,
        limit: i64,
    ) -> AppResult<Vec<FeeRecord>> {
        let sql = match status {
            Some(_) => {
                r#"
                SELECT b.*, u.username, u.full_name, u.role, bk.title AS book_title
                FROM borrows b
                JOIN users u ON u.id = b.user_id
                LEFT JOIN books bk ON bk.id = b.book_id
                WHERE b.fee_applied > 0
                  AND u.role IN ('student', 'faculty')
                  AND b.payment_status = $1
                ORDER BY b.borrowed_at DESC
                LIMIT $2
                "#
            }
            None => {
                r#"
                SELECT b.*, u.username, u.full_name, u.role, bk.title AS book_title
                FROM borrows b
                JOIN users u ON u.id = b.user_id
                LEFT JOIN books bk ON bk.id = b.book_id
                WHERE b.fee_applied > 0
                  AND u.role IN ('student', 'faculty')
                ORDER BY b.borrowed_at DESC
                LIMIT $1
                "#
            }
        };

        let mut query = sqlx::query(sql);
        if let Some(status) = status {
            query = query.bind(status);
        }
        query = query.bind(limit);

        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| FeeRecord {
                borrow: borrow_from_row(row),
                username: Some(row.get("username")),
                full_name: row.get("full_name"),
                role: Some(row.get("role")),
                book_title: row.get("book_title"),
            })
            .collect())
    }
}

fn borrow_with_user_from_row(row: &sqlx::postgres::PgRow) -> BorrowWithUser {
    BorrowWithUser {
        borrow: borrow_from_row(row),
        username: row.get("username"),
        full_name: row.get("full_name"),
        role: row.get("role"),
    }
}
