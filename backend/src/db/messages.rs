use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::{Connection, Message, ReadCursor};

// Message operations
pub async fn list_between<'e, E>(executor: E, a: Uuid, b: Uuid) -> Result<Vec<Message>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, sender_id, receiver_id, content, created_at
        FROM messages
        WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_all(executor)
    .await
}

/// Creation time of the newest message exchanged by `a` and `b`.
pub async fn latest_between(
    pool: &SqlitePool,
    a: Uuid,
    b: Uuid,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        r#"
        SELECT created_at
        FROM messages
        WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_optional(pool)
    .await
}

async fn insert_message(
    conn: &mut SqliteConnection,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: &str,
) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (id, sender_id, receiver_id, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, sender_id, receiver_id, content, created_at
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(sender_id)
    .bind(receiver_id)
    .bind(content)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

// Read cursor operations
pub async fn get_cursor<'e, E>(executor: E, connection_id: Uuid) -> Result<Option<ReadCursor>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ReadCursor>(
        "SELECT connection_id, last_read_at FROM read_cursors WHERE connection_id = ?",
    )
    .bind(connection_id)
    .fetch_optional(executor)
    .await
}

/// Moves the cursor forward to `read_at`; never moves it back.
pub async fn advance_cursor(
    conn: &mut SqliteConnection,
    connection_id: Uuid,
    read_at: DateTime<Utc>,
) -> Result<DateTime<Utc>, sqlx::Error> {
    let current = get_cursor(&mut *conn, connection_id).await?;
    if let Some(cursor) = current.as_ref().filter(|c| c.last_read_at >= read_at) {
        return Ok(cursor.last_read_at);
    }

    sqlx::query(
        r#"
        INSERT INTO read_cursors (connection_id, last_read_at)
        VALUES (?, ?)
        ON CONFLICT(connection_id) DO UPDATE SET last_read_at = excluded.last_read_at
        "#,
    )
    .bind(connection_id)
    .bind(read_at)
    .execute(&mut *conn)
    .await?;

    Ok(read_at)
}

/// Marks a thread read up to `read_at` outside any wider transaction, as
/// live delivery does.
pub async fn mark_read(
    pool: &SqlitePool,
    connection_id: Uuid,
    read_at: DateTime<Utc>,
) -> Result<DateTime<Utc>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    advance_cursor(&mut conn, connection_id, read_at).await
}

/// Loads the full thread for `connection` and marks it read up to its newest
/// row, atomically.
pub async fn read_thread(pool: &SqlitePool, connection: &Connection) -> Result<Vec<Message>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let messages = list_between(&mut *tx, connection.user_id, connection.connected_user_id).await?;
    if let Some(latest) = messages.last() {
        advance_cursor(&mut tx, connection.id, latest.created_at).await?;
    }

    tx.commit().await?;
    Ok(messages)
}

/// Stores a message from the connection's owner to its peer. The sender has
/// obviously read up to their own message, so their cursor moves too.
pub async fn send_message(
    pool: &SqlitePool,
    connection: &Connection,
    content: &str,
) -> Result<Message, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let message = insert_message(&mut tx, connection.user_id, connection.connected_user_id, content).await?;
    advance_cursor(&mut tx, connection.id, message.created_at).await?;

    tx.commit().await?;
    Ok(message)
}
