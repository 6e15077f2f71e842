use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::models::Message;

/// What the feed carries: inserted message rows, and read-cursor moves so
/// unread views can refresh without waiting for the next insert.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Inserted(Message),
    Read { user_id: Uuid, connection_id: Uuid },
}

/// Which events a subscriber cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub receiver_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    /// Matches rows where this user is either side.
    pub involving: Option<Uuid>,
}

impl MessageFilter {
    pub fn to_receiver(receiver_id: Uuid) -> Self {
        Self { receiver_id: Some(receiver_id), ..Self::default() }
    }

    pub fn from_sender(mut self, sender_id: Uuid) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    pub fn involving(user_id: Uuid) -> Self {
        Self { involving: Some(user_id), ..Self::default() }
    }

    /// Read events only reach plain `involving` subscribers of that user.
    pub fn matches(&self, event: &FeedEvent) -> bool {
        match event {
            FeedEvent::Inserted(message) => self.matches_message(message),
            FeedEvent::Read { user_id, .. } => {
                self.receiver_id.is_none()
                    && self.sender_id.is_none()
                    && self.involving == Some(*user_id)
            }
        }
    }

    fn matches_message(&self, message: &Message) -> bool {
        self.receiver_id.is_none_or(|id| message.receiver_id == id)
            && self.sender_id.is_none_or(|id| message.sender_id == id)
            && self
                .involving
                .is_none_or(|id| message.sender_id == id || message.receiver_id == id)
    }
}

/// Fan-out of feed events to live subscribers.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<FeedEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        Self { tx: broadcast::channel(capacity).0 }
    }

    /// Announces an inserted row. Having nobody listening is fine.
    pub fn publish(&self, message: Message) {
        let receivers = self.tx.send(FeedEvent::Inserted(message)).unwrap_or(0);
        tracing::debug!(receivers, "published message insert");
    }

    /// Announces that `user_id` has read `connection_id` up to its cursor.
    pub fn publish_read(&self, user_id: Uuid, connection_id: Uuid) {
        let receivers = self
            .tx
            .send(FeedEvent::Read { user_id, connection_id })
            .unwrap_or(0);
        tracing::debug!(receivers, %connection_id, "published read cursor move");
    }

    pub fn subscribe(&self, filter: MessageFilter) -> Subscription {
        Subscription { rx: self.tx.subscribe(), filter }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live, filtered view of the feed. Dropping it releases the channel slot.
pub struct Subscription {
    rx: broadcast::Receiver<FeedEvent>,
    filter: MessageFilter,
}

impl Subscription {
    /// Next matching event, or `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change feed subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
