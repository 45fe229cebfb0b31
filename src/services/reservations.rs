//! Reservation queue service

use serde_json::json;

use crate::{
    error::{AppError, AppResult, InvalidStateKind},
    models::{
        notification::NotificationKind,
        reservation::{PagedReservations, Reservation},
    },
    repository::Repository,
    services::notifications::NotificationService,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    notifier: NotificationService,
}

impl ReservationsService {
    pub fn new(repository: Repository, notifier: NotificationService) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Reserve a book for a user. Only permitted while the book is fully
    /// checked out, and only once per user until the reservation is served.
    pub async fn reserve(&self, user_id: i32, book_id: i32) -> AppResult<Reservation> {
        let book = self.repository.books.get_by_id(book_id).await?;

        if self
            .repository
            .reservations
            .find_pending(user_id, book_id)
            .await?
            .is_some()
        {
            return Err(AppError::InvalidState(
                InvalidStateKind::AlreadyReserved,
                "Already reserved".to_string(),
            ));
        }

        if book.available_copies > 0 {
            return Err(AppError::InvalidState(
                InvalidStateKind::StillAvailable,
                "Book is currently available; reservation not allowed".to_string(),
            ));
        }

        self.repository.reservations.create(user_id, book_id).await
    }

    /// Drain the queue for a book: notify every pending reservation, oldest
    /// first, and flip each to notified.
    ///
    /// The whole backlog drains on every release event, not just one
    /// reservation per freed copy; callers wanting one-copy-one-notification
    /// semantics must track availability themselves.
    pub async fn notify_available(&self, book_id: i32) -> AppResult<usize> {
        let pending = self.repository.reservations.pending_for_book(book_id).await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let book = self.repository.books.get_by_id(book_id).await?;

        let count = pending.len();
        for entry in pending {
            self.notifier
                .publish(
                    entry.reservation.user_id,
                    NotificationKind::BookAvailable,
                    json!({
                        "username": entry.username,
                        "full_name": entry.full_name,
                        "book_id": book_id,
                        "book_title": book.title,
                    }),
                )
                .await?;
            self.repository
                .reservations
                .mark_notified(entry.reservation.id)
                .await?;
        }

        Ok(count)
    }

    pub async fn get(&self, id: i32) -> AppResult<Reservation> {
        self.repository.reservations.get_by_id(id).await
    }

    /// Cancel a reservation; existence is checked by the caller
    pub async fn cancel(&self, id: i32) -> AppResult<()> {
        if self.repository.reservations.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::Internal("Failed to cancel reservation".to_string()))
        }
    }

    /// Paged pending reservations, optionally for one book
    pub async fn list_pending(
        &self,
        book_id: Option<i32>,
        page: i64,
        page_size: i64,
    ) -> AppResult<PagedReservations> {
        let offset = (page - 1) * page_size;
        let (items, total) = self
            .repository
            .reservations
            .list_pending(book_id, offset, page_size)
            .await?;

        Ok(PagedReservations {
            items,
            page,
            page_size,
            total,
        })
    }
}
