//! Notification bus: durable records plus in-process live fan-out
//!
//! Published records are appended to the notifications table (the primary
//! copy), then pushed into every live subscription buffer for the target
//! user. Subscription buffers are per-connection mpsc queues; dropping the
//! subscription handle deregisters it, so a disconnected streaming client
//! leaves nothing behind.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;

use crate::{
    error::AppResult,
    models::notification::{Notification, NotificationKind},
    repository::Repository,
};

struct Slot {
    handle: u64,
    sender: mpsc::UnboundedSender<Notification>,
}

#[derive(Default)]
struct HubInner {
    next_handle: u64,
    subscribers: HashMap<i32, Vec<Slot>>,
}

/// In-process registry of live subscriptions, keyed by user id
#[derive(Clone, Default)]
pub struct NotificationHub {
    inner: Arc<Mutex<HubInner>>,
}

impl NotificationHub {
    /// Register a new per-connection buffer for a user
    pub fn subscribe(&self, user_id: i32) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().expect("notification hub lock poisoned");
        inner.next_handle += 1;
        let handle = inner.next_handle;
        inner
            .subscribers
            .entry(user_id)
            .or_default()
            .push(Slot { handle, sender });

        Subscription {
            hub: self.clone(),
            user_id,
            handle,
            receiver,
        }
    }

    /// Push a record to every live subscription of its user, pruning
    /// subscriptions whose receiver is gone
    pub fn dispatch(&self, notification: &Notification) {
        let mut inner = self.inner.lock().expect("notification hub lock poisoned");
        if let Some(slots) = inner.subscribers.get_mut(&notification.user_id) {
            slots.retain(|slot| slot.sender.send(notification.clone()).is_ok());
            if slots.is_empty() {
                inner.subscribers.remove(&notification.user_id);
            }
        }
    }

    fn remove(&self, user_id: i32, handle: u64) {
        let mut inner = self.inner.lock().expect("notification hub lock poisoned");
        if let Some(slots) = inner.subscribers.get_mut(&user_id) {
            slots.retain(|slot| slot.handle != handle);
            if slots.is_empty() {
                inner.subscribers.remove(&user_id);
            }
        }
    }

    /// Live subscription count for a user
    pub fn subscriber_count(&self, user_id: i32) -> usize {
        let inner = self.inner.lock().expect("notification hub lock poisoned");
        inner.subscribers.get(&user_id).map_or(0, Vec::len)
    }
}

/// A live subscription handle. Receives every record published for the user
/// while held; unsubscribes on drop.
pub struct Subscription {
    hub: NotificationHub,
    user_id: i32,
    handle: u64,
    receiver: mpsc::UnboundedReceiver<Notification>,
}

impl Subscription {
    /// Await the next record; `None` once the hub side is gone
    pub async fn recv(&mut self) -> Option<Notification> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.remove(self.user_id, self.handle);
    }
}

impl Stream for Subscription {
    type Item = Notification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Outcome of a mark-read request; misses are soft, not HTTP errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkReadStatus {
    Marked,
    NotFound,
    NotOwner,
}

/// Notification service: durable store plus live fan-out
#[derive(Clone)]
pub struct NotificationService {
    repository: Repository,
    hub: NotificationHub,
}

impl NotificationService {
    pub fn new(repository: Repository, hub: NotificationHub) -> Self {
        Self { repository, hub }
    }

    /// Append a record and wake the user's live subscriptions
    pub async fn publish(
        &self,
        user_id: i32,
        kind: NotificationKind,
        data: serde_json::Value,
    ) -> AppResult<Notification> {
        let notification = self.repository.notifications.insert(user_id, kind, data).await?;
        self.hub.dispatch(&notification);
        Ok(notification)
    }

    pub fn subscribe(&self, user_id: i32) -> Subscription {
        self.hub.subscribe(user_id)
    }

    pub async fn list_unread(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        self.repository.notifications.list_unread(user_id).await
    }

    /// Mark a record read on behalf of a user. Unknown ids and other users'
    /// records are reported softly; marking twice is a no-op success.
    pub async fn mark_read(&self, id: i64, user_id: i32) -> AppResult<MarkReadStatus> {
        match self.repository.notifications.get_by_id(id).await? {
            None => Ok(MarkReadStatus::NotFound),
            Some(notification) if notification.user_id != user_id => Ok(MarkReadStatus::NotOwner),
            Some(_) => {
                self.repository.notifications.mark_read(id).await?;
                Ok(MarkReadStatus::Marked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: i64, user_id: i32) -> Notification {
        Notification {
            id,
            user_id,
            kind: NotificationKind::BookAvailable.as_str().to_string(),
            data: serde_json::json!({ "book_id": 1 }),
            read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_dispatched_records() {
        let hub = NotificationHub::default();
        let mut sub = hub.subscribe(7);

        hub.dispatch(&record(1, 7));
        hub.dispatch(&record(2, 7));

        assert_eq!(sub.recv().await.unwrap().id, 1);
        assert_eq!(sub.recv().await.unwrap().id, 2);
    }

    #[tokio::test]
    async fn dispatch_is_scoped_to_the_target_user() {
        let hub = NotificationHub::default();
        let mut sub_a = hub.subscribe(1);
        let _sub_b = hub.subscribe(2);

        hub.dispatch(&record(10, 2));
        hub.dispatch(&record(11, 1));

        // user 1 only sees their own record
        assert_eq!(sub_a.recv().await.unwrap().id, 11);
    }

    #[tokio::test]
    async fn every_subscription_of_a_user_is_woken() {
        let hub = NotificationHub::default();
        let mut first = hub.subscribe(3);
        let mut second = hub.subscribe(3);

        hub.dispatch(&record(5, 3));

        assert_eq!(first.recv().await.unwrap().id, 5);
        assert_eq!(second.recv().await.unwrap().id, 5);
    }

    #[tokio::test]
    async fn dropping_the_last_subscription_leaves_no_residual_entry() {
        let hub = NotificationHub::default();
        let first = hub.subscribe(9);
        let second = hub.subscribe(9);
        assert_eq!(hub.subscriber_count(9), 2);

        drop(first);
        assert_eq!(hub.subscriber_count(9), 1);

        drop(second);
        assert_eq!(hub.subscriber_count(9), 0);
        assert!(hub.inner.lock().unwrap().subscribers.get(&9).is_none());
    }

    #[tokio::test]
    async fn dispatch_without_subscribers_is_a_no_op() {
        let hub = NotificationHub::default();
        hub.dispatch(&record(1, 42));
        assert_eq!(hub.subscriber_count(42), 0);
    }
}
