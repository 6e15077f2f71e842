use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::constants::{PLACEHOLDER_LATITUDE, PLACEHOLDER_LONGITUDE};
use crate::models::{PingPongTable, TableForm};

const TABLE_COLUMNS: &str =
    "id, name, address, city, latitude, longitude, description, created_by, created_at";

fn description(form: &TableForm) -> Option<&str> {
    form.description.as_deref().map(str::trim).filter(|d| !d.is_empty())
}

/// Newest first.
pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<PingPongTable>, sqlx::Error> {
    sqlx::query_as::<_, PingPongTable>(&format!(
        "SELECT {TABLE_COLUMNS} FROM ping_pong_tables ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn get_table(pool: &SqlitePool, id: Uuid) -> Result<Option<PingPongTable>, sqlx::Error> {
    sqlx::query_as::<_, PingPongTable>(&format!(
        "SELECT {TABLE_COLUMNS} FROM ping_pong_tables WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create_table(
    pool: &SqlitePool,
    created_by: Uuid,
    form: &TableForm,
) -> Result<PingPongTable, sqlx::Error> {
    sqlx::query_as::<_, PingPongTable>(&format!(
        "INSERT INTO ping_pong_tables (id, name, address, city, latitude, longitude, description, created_by, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {TABLE_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(form.name.trim())
    .bind(form.address.trim())
    .bind(form.city.trim())
    .bind(PLACEHOLDER_LATITUDE)
    .bind(PLACEHOLDER_LONGITUDE)
    .bind(description(form))
    .bind(created_by)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// Only the creator's rows match; `None` means nothing was updated.
pub async fn update_table(
    pool: &SqlitePool,
    id: Uuid,
    created_by: Uuid,
    form: &TableForm,
) -> Result<Option<PingPongTable>, sqlx::Error> {
    sqlx::query_as::<_, PingPongTable>(&format!(
        "UPDATE ping_pong_tables SET name = ?, address = ?, city = ?, description = ?
         WHERE id = ? AND created_by = ?
         RETURNING {TABLE_COLUMNS}"
    ))
    .bind(form.name.trim())
    .bind(form.address.trim())
    .bind(form.city.trim())
    .bind(description(form))
    .bind(id)
    .bind(created_by)
    .fetch_optional(pool)
    .await
}

pub async fn delete_table(pool: &SqlitePool, id: Uuid, created_by: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ping_pong_tables WHERE id = ? AND created_by = ?")
        .bind(id)
        .bind(created_by)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
