use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// A pending request joined with its sender, as the dashboard lists it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IncomingRequest {
    pub id: Uuid,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sender_name: String,
    pub sender_skill_level: super::SkillLevel,
    pub sender_city: String,
}

/// One direction of an accepted connection; every pair has two rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Connection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub connected_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A connection with the display name of the other side.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectionWithPeer {
    pub id: Uuid,
    pub connected_user_id: Uuid,
    pub connected_user_name: String,
}
