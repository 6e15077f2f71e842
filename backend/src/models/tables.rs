use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A physical ping pong table somebody added to the directory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PingPongTable {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Add/edit form payload. Coordinates are never user supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableForm {
    pub name: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub description: Option<String>,
}
