use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::constants::CHANGE_FEED_CAPACITY;
use crate::services::{ChangeFeed, IdentityProvider};

pub type SharedIdentity = Arc<dyn IdentityProvider>;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub identity: SharedIdentity,
    pub feed: ChangeFeed,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, identity: SharedIdentity) -> Self {
        Self {
            db_pool,
            identity,
            feed: ChangeFeed::new(CHANGE_FEED_CAPACITY),
        }
    }
}
