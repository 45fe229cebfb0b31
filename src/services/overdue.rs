//! Background overdue scanner
//!
//! Re-scans active borrows on a fixed interval and emits `overdue`
//! notifications to borrowers plus `overdue_librarian` notifications to
//! every elevated-role user. A failed tick is logged and retried on the
//! next interval; the loop only exits on the shutdown signal.

use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::notification::NotificationKind,
    repository::Repository,
    services::{
        fees::{hours_overdue, FeeSchedule},
        notifications::NotificationService,
    },
};

pub struct OverdueScanner {
    repository: Repository,
    notifier: NotificationService,
    fees: FeeSchedule,
    interval: Duration,
}

impl OverdueScanner {
    pub fn new(
        repository: Repository,
        notifier: NotificationService,
        config: &CirculationConfig,
    ) -> Self {
        Self {
            repository,
            notifier,
            fees: FeeSchedule::from_config(config),
            interval: Duration::from_secs(config.overdue_check_interval_secs),
        }
    }

    /// Run the scan loop until the shutdown signal fires. The first scan
    /// happens immediately; no pooled connection is held across sleeps.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(interval_secs = self.interval.as_secs(), "overdue scanner started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.scan().await {
                            tracing::error!(error = %e, "overdue scan failed; retrying next tick");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("overdue scanner stopped");
                        break;
                    }
                }
            }
        })
    }

    async fn scan(&self) -> AppResult<()> {
        let now = Utc::now();
        let overdue = self.repository.borrows.list_overdue(now).await?;

        tracing::debug!(count = overdue.len(), "overdue borrows found");
        if overdue.is_empty() {
            return Ok(());
        }

        let librarians = self.repository.users.list_elevated().await?;

        for row in overdue {
            let hours = hours_overdue(row.borrow.due_date, now);
            let current_fee = self.fees.amount_due(row.borrow.due_date, now);

            self.notifier
                .publish(
                    row.borrow.user_id,
                    NotificationKind::Overdue,
                    json!({
                        "username": row.username,
                        "book_id": row.borrow.book_id,
                        "book_title": row.book_title,
                        "borrow_id": row.borrow.id,
                        "hours_overdue": hours,
                        "current_fee": current_fee,
                        "due_date": row.borrow.due_date,
                    }),
                )
                .await?;

            for librarian in &librarians {
                self.notifier
                    .publish(
                        librarian.id,
                        NotificationKind::OverdueLibrarian,
                        json!({
                            "borrower_username": row.username,
                            "borrower_full_name": row.full_name,
                            "borrower_role": row.role,
                            "book_id": row.borrow.book_id,
                            "book_title": row.book_title,
                            "borrow_id": row.borrow.id,
                            "hours_overdue": hours,
                            "current_fee": current_fee,
                            "due_date": row.borrow.due_date,
                        }),
                    )
                    .await?;
            }
        }

        Ok(())
    }
}
