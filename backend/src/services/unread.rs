use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{connections, messages};

/// Connection id to "has unread". Connections without any messages are
/// absent.
pub type UnreadStatus = HashMap<Uuid, bool>;

/// A thread is unread when its newest message is newer than the cursor, or
/// when it has never been read.
pub fn is_unread(latest_message_at: DateTime<Utc>, last_read_at: Option<DateTime<Utc>>) -> bool {
    last_read_at.is_none_or(|read_at| latest_message_at > read_at)
}

/// Full rescan of every connection owned by `user_id`, one lookup at a time.
pub async fn unread_status(pool: &SqlitePool, user_id: Uuid) -> Result<UnreadStatus, sqlx::Error> {
    let mut status = UnreadStatus::new();

    for connection in connections::list_connections(pool, user_id).await? {
        let Some(latest) =
            messages::latest_between(pool, user_id, connection.connected_user_id).await?
        else {
            continue;
        };

        let cursor = messages::get_cursor(pool, connection.id).await?;
        status.insert(connection.id, is_unread(latest, cursor.map(|c| c.last_read_at)));
    }

    tracing::debug!(%user_id, connections = status.len(), "computed unread status");
    Ok(status)
}
