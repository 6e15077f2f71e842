use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{Connection, ConnectionRequest, ConnectionWithPeer, IncomingRequest, RequestStatus};

// Connection request operations
pub async fn create_request(
    pool: &SqlitePool,
    sender_id: Uuid,
    receiver_id: Uuid,
    message: &str,
) -> Result<ConnectionRequest, sqlx::Error> {
    sqlx::query_as::<_, ConnectionRequest>(
        r#"
        INSERT INTO connection_requests (id, sender_id, receiver_id, message, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, sender_id, receiver_id, message, status, created_at
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(sender_id)
    .bind(receiver_id)
    .bind(message)
    .bind(RequestStatus::Pending)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn get_request<'e, E>(executor: E, id: Uuid) -> Result<Option<ConnectionRequest>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ConnectionRequest>(
        r#"
        SELECT id, sender_id, receiver_id, message, status, created_at
        FROM connection_requests
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Newest pending requests addressed to `receiver_id`, with sender details.
pub async fn list_pending_for(
    pool: &SqlitePool,
    receiver_id: Uuid,
    limit: i64,
) -> Result<Vec<IncomingRequest>, sqlx::Error> {
    sqlx::query_as::<_, IncomingRequest>(
        r#"
        SELECT r.id, r.message, r.created_at,
               p.name AS sender_name, p.skill_level AS sender_skill_level, p.city AS sender_city
        FROM connection_requests r
        JOIN profiles p ON p.id = r.sender_id
        WHERE r.receiver_id = ? AND r.status = ?
        ORDER BY r.created_at DESC, r.id DESC
        LIMIT ?
        "#,
    )
    .bind(receiver_id)
    .bind(RequestStatus::Pending)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn count_pending_for(pool: &SqlitePool, receiver_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM connection_requests WHERE receiver_id = ? AND status = ?",
    )
    .bind(receiver_id)
    .bind(RequestStatus::Pending)
    .fetch_one(pool)
    .await
}

/// Marks the request accepted and links both users, in one transaction.
/// Returns `None` when the request does not exist or is not addressed to
/// `receiver_id`.
pub async fn accept_request(
    pool: &SqlitePool,
    request_id: Uuid,
    receiver_id: Uuid,
) -> Result<Option<ConnectionRequest>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(request) = get_request(&mut *tx, request_id).await? else {
        return Ok(None);
    };
    if request.receiver_id != receiver_id {
        return Ok(None);
    }

    let accepted = sqlx::query_as::<_, ConnectionRequest>(
        r#"
        UPDATE connection_requests SET status = ?
        WHERE id = ?
        RETURNING id, sender_id, receiver_id, message, status, created_at
        "#,
    )
    .bind(RequestStatus::Accepted)
    .bind(request_id)
    .fetch_one(&mut *tx)
    .await?;

    for (user_id, connected_user_id) in [
        (request.sender_id, request.receiver_id),
        (request.receiver_id, request.sender_id),
    ] {
        sqlx::query(
            r#"
            INSERT INTO connections (id, user_id, connected_user_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, connected_user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(connected_user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(Some(accepted))
}

// Connection operations
pub async fn list_connections(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Connection>, sqlx::Error> {
    sqlx::query_as::<_, Connection>(
        r#"
        SELECT id, user_id, connected_user_id, created_at
        FROM connections
        WHERE user_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_connections_with_peers(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<ConnectionWithPeer>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionWithPeer>(
        r#"
        SELECT c.id, c.connected_user_id, p.name AS connected_user_name
        FROM connections c
        JOIN profiles p ON p.id = c.connected_user_id
        WHERE c.user_id = ?
        ORDER BY p.name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// The connection row owned by `user_id`, if any.
pub async fn get_connection<'e, E>(
    executor: E,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Connection>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Connection>(
        r#"
        SELECT id, user_id, connected_user_id, created_at
        FROM connections
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_connection_between(
    pool: &SqlitePool,
    user_id: Uuid,
    connected_user_id: Uuid,
) -> Result<Option<Connection>, sqlx::Error> {
    sqlx::query_as::<_, Connection>(
        r#"
        SELECT id, user_id, connected_user_id, created_at
        FROM connections
        WHERE user_id = ? AND connected_user_id = ?
        "#,
    )
    .bind(user_id)
    .bind(connected_user_id)
    .fetch_optional(pool)
    .await
}

pub async fn count_connections(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM connections WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
