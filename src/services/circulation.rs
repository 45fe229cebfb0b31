//! Borrow/return workflow service

use chrono::{Duration, Utc};
use serde_json::json;

use crate::{
    error::{AppError, AppResult, InvalidStateKind},
    models::{
        borrow::{Borrow, BorrowWithUser, OverdueBorrow},
        notification::NotificationKind,
    },
    repository::Repository,
    services::{
        fees::{hours_overdue, FeeSchedule},
        notifications::NotificationService,
        reservations::ReservationsService,
    },
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    notifier: NotificationService,
    reservations: ReservationsService,
    fees: FeeSchedule,
    loan_period_days: i64,
}

impl CirculationService {
    pub fn new(
        repository: Repository,
        notifier: NotificationService,
        reservations: ReservationsService,
        fees: FeeSchedule,
        loan_period_days: i64,
    ) -> Self {
        Self {
            repository,
            notifier,
            reservations,
            fees,
            loan_period_days,
        }
    }

    /// Borrow a book: availability and per-user cap checks, then the ledger
    /// decrement and the borrow insert in one transaction.
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<Borrow> {
        let book = self.repository.books.get_by_id(book_id).await?;

        if book.available_copies <= 0 {
            return Err(AppError::Unavailable("No copies available".to_string()));
        }

        let user = self.repository.users.get_by_id(user_id).await?;
        if let Some(cap) = user.max_borrows {
            let active = self.repository.borrows.count_active_for_user(user_id).await?;
            if active >= cap as i64 {
                return Err(AppError::LimitExceeded(format!(
                    "Borrow limit reached ({}/{})",
                    active, cap
                )));
            }
        }

        let now = Utc::now();
        let due_date = now + Duration::days(self.loan_period_days);

        let mut tx = self.repository.pool.begin().await?;

        // The availability check above is advisory; the conditional update is
        // what actually guards the last copy under concurrency.
        if !self.repository.books.checkout_copy(&mut tx, book_id).await? {
            return Err(AppError::Unavailable("No copies available".to_string()));
        }

        let borrow = self
            .repository
            .borrows
            .insert(&mut tx, user_id, book_id, now, due_date)
            .await?;

        tx.commit().await?;

        if let Err(e) = self
            .notifier
            .publish(
                user_id,
                NotificationKind::Borrowed,
                json!({ "book_id": book_id, "borrow_id": borrow.id }),
            )
            .await
        {
            tracing::warn!(error = %e, borrow_id = borrow.id, "failed to publish borrowed notification");
        }

        Ok(borrow)
    }

    /// Return a borrow: sets the return timestamp and the late fee, puts the
    /// copy back on the shelf, then drains the reservation queue.
    pub async fn return_book(&self, borrow_id: i32, user_id: i32) -> AppResult<Borrow> {
        let mut tx = self.repository.pool.begin().await?;

        let borrow = self.repository.borrows.lock_by_id(&mut tx, borrow_id).await?;

        if borrow.user_id != user_id {
            return Err(AppError::Authorization(
                "You cannot return another user's borrow".to_string(),
            ));
        }

        if borrow.returned_at.is_some() {
            return Err(AppError::InvalidState(
                InvalidStateKind::AlreadyReturned,
                "Already returned".to_string(),
            ));
        }

        let now = Utc::now();
        let fee = self.fees.amount_due(borrow.due_date, now);

        let returned = self
            .repository
            .borrows
            .mark_returned(&mut tx, borrow_id, now, fee)
            .await?;

        // Skipped (not failed) when the shelf is already full.
        let copy_released = self
            .repository
            .books
            .release_copy(&mut tx, borrow.book_id)
            .await?;

        tx.commit().await?;

        if copy_released {
            // A drain failure must not undo or fail the return.
            if let Err(e) = self.reservations.notify_available(borrow.book_id).await {
                tracing::warn!(
                    error = %e,
                    book_id = borrow.book_id,
                    "failed to drain reservation queue after return"
                );
            }
        }

        if let Err(e) = self
            .notifier
            .publish(
                user_id,
                NotificationKind::Returned,
                json!({ "borrow_id": returned.id, "book_id": returned.book_id, "fee_applied": returned.fee_applied }),
            )
            .await
        {
            tracing::warn!(error = %e, borrow_id = returned.id, "failed to publish returned notification");
        }

        Ok(returned)
    }

    /// The caller's borrows, with `?include_returned=true` for history
    pub async fn list_for_user(
        &self,
        user_id: i32,
        include_returned: bool,
    ) -> AppResult<Vec<Borrow>> {
        self.repository.borrows.list_for_user(user_id, include_returned).await
    }

    /// All borrows with borrower identity, filtered by borrow date range
    pub async fn list_all(
        &self,
        start_date: Option<chrono::DateTime<Utc>>,
        end_date: Option<chrono::DateTime<Utc>>,
        include_returned: bool,
    ) -> AppResult<Vec<BorrowWithUser>> {
        self.repository.borrows.list_all(start_date, end_date, include_returned).await
    }

    /// Overdue borrows with the live-computed hours and fine
    pub async fn list_overdue(&self) -> AppResult<Vec<OverdueBorrow>> {
        let now = Utc::now();
        let rows = self.repository.borrows.list_overdue(now).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let hours = hours_overdue(row.borrow.due_date, now);
                OverdueBorrow {
                    id: row.borrow.id,
                    user_id: row.borrow.user_id,
                    username: row.username,
                    full_name: row.full_name,
                    role: row.role,
                    book_id: row.borrow.book_id,
                    book_title: row.book_title,
                    borrowed_at: row.borrow.borrowed_at,
                    due_date: row.borrow.due_date,
                    returned_at: row.borrow.returned_at,
                    hours_overdue: hours,
                    current_fee: self.fees.amount_due(row.borrow.due_date, now),
                    fee_applied: row.borrow.fee_applied,
                    payment_status: row.borrow.payment_status,
                    paid_at: row.borrow.paid_at,
                }
            })
            .collect())
    }
}
