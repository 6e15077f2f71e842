use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == b) || (self.sender_id == b && self.receiver_id == a)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReadCursor {
    pub connection_id: Uuid,
    pub last_read_at: DateTime<Utc>,
}

/// Where a row entered the open thread from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Returned by our own send.
    Sent,
    /// Pushed by the change feed.
    Realtime,
}

/// The thread a user has open with one connection.
///
/// Rows are kept in `(created_at, id)` order and are unique by id, so the
/// copy returned by a send and a later realtime copy of the same row
/// collapse into one entry.
#[derive(Debug, Clone, Serialize)]
pub struct MessageThread {
    pub me: Uuid,
    pub peer: Uuid,
    pub messages: Vec<Message>,
}

impl MessageThread {
    pub fn new(me: Uuid, peer: Uuid, mut history: Vec<Message>) -> Self {
        history.retain(|m| m.is_between(me, peer));
        history.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        history.dedup_by_key(|m| m.id);
        Self { me, peer, messages: history }
    }

    /// Whether a realtime event belongs in this thread: the peer writing to us.
    pub fn accepts(&self, message: &Message) -> bool {
        message.sender_id == self.peer && message.receiver_id == self.me
    }

    /// Adds a row, returning false when it was already present or belongs to
    /// a different conversation.
    pub fn apply(&mut self, message: Message, delivery: Delivery) -> bool {
        let belongs = match delivery {
            Delivery::Sent => message.sender_id == self.me && message.receiver_id == self.peer,
            Delivery::Realtime => self.accepts(&message),
        };
        if !belongs || self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }

        let at = self
            .messages
            .partition_point(|m| (m.created_at, m.id) <= (message.created_at, message.id));
        self.messages.insert(at, message);
        true
    }

    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_mine(&self, message: &Message) -> bool {
        message.sender_id == self.me
    }
}
