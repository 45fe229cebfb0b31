//! Late-fee payment service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult, InvalidStateKind},
    models::borrow::{Borrow, BorrowWithUser, FeeRecord, PaymentStatus, PaymentSummary},
    repository::Repository,
    services::fees::FeeSchedule,
};

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
    fees: FeeSchedule,
}

impl PaymentsService {
    pub fn new(repository: Repository, fees: FeeSchedule) -> Self {
        Self { repository, fees }
    }

    /// Mark a late fee as paid
    pub async fn process_payment(&self, borrow_id: i32, user_id: i32) -> AppResult<Borrow> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;

        if borrow.user_id != user_id {
            return Err(AppError::Authorization(
                "You cannot pay for another user's fee".to_string(),
            ));
        }

        if borrow.payment_status == PaymentStatus::Paid {
            return Err(AppError::InvalidState(
                InvalidStateKind::AlreadyPaid,
                "Fee already paid".to_string(),
            ));
        }

        if borrow.fee_applied <= 0 {
            return Err(AppError::InvalidState(
                InvalidStateKind::NothingToPay,
                "No fee to pay".to_string(),
            ));
        }

        self.repository.borrows.mark_paid(borrow_id, Utc::now()).await
    }

    /// All unpaid fees for a user: returned-late borrows with a recorded fee,
    /// plus still-out overdue borrows carrying their live-computed fine.
    pub async fn unpaid_fees(&self, user_id: i32) -> AppResult<Vec<Borrow>> {
        let now = Utc::now();
        let mut unpaid = self.repository.payments.list_unpaid_returned(user_id).await?;

        let overdue = self.repository.payments.list_overdue_active(user_id, now).await?;
        unpaid.extend(overdue.into_iter().map(|mut borrow| {
            borrow.fee_applied = self.fees.amount_due(borrow.due_date, now);
            borrow
        }));

        Ok(unpaid)
    }

    /// Fee totals for one user
    pub async fn summary(&self, user_id: i32) -> AppResult<PaymentSummary> {
        let unpaid = self.unpaid_fees(user_id).await?;
        let paid = self.repository.payments.list_paid(user_id).await?;

        Ok(PaymentSummary {
            total_unpaid: unpaid.iter().map(|b| b.fee_applied).sum(),
            total_paid: paid.iter().map(|b| b.fee_applied).sum(),
            count_unpaid: unpaid.len() as i64,
            count_paid: paid.len() as i64,
        })
    }

    /// All unpaid fees across borrowers, with user identity (librarian view)
    pub async fn all_unpaid_fees(&self) -> AppResult<Vec<BorrowWithUser>> {
        let now = Utc::now();
        let mut unpaid = self.repository.payments.list_all_unpaid_returned().await?;

        let overdue = self.repository.payments.list_all_overdue_active(now).await?;
        unpaid.extend(overdue.into_iter().map(|mut entry| {
            entry.borrow.fee_applied = self.fees.amount_due(entry.borrow.due_date, now);
            entry
        }));

        Ok(unpaid)
    }

    /// Fee totals across all borrowers (librarian view)
    pub async fn all_summary(&self) -> AppResult<PaymentSummary> {
        let unpaid = self.all_unpaid_fees().await?;
        let paid = self.repository.payments.list_all_paid().await?;

        Ok(PaymentSummary {
            total_unpaid: unpaid.iter().map(|e| e.borrow.fee_applied).sum(),
            total_paid: paid.iter().map(|e| e.borrow.fee_applied).sum(),
            count_unpaid: unpaid.len() as i64,
            count_paid: paid.len() as i64,
        })
    }

    /// Fee history for one user, optionally filtered by payment status
    pub async fn history(
        &self,
        user_id: i32,
        status: Option<PaymentStatus>,
    ) -> AppResult<Vec<FeeRecord>> {
        self.repository.payments.list_fees(user_id, status).await
    }

    /// Fee history across all borrowers (librarian view)
    pub async fn all_history(
        &self,
        status: Option<PaymentStatus>,
        limit: i64,
    ) -> AppResult<Vec<FeeRecord>> {
        self.repository.payments.list_all_fees(status, limit).await
    }
}
