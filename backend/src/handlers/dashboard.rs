use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::constants::{
    DASHBOARD_REQUEST_PREVIEW, DASHBOARD_ROUTE, EMPTY_REQUESTS_MESSAGE, REQUESTS_HEADLINE,
};
use crate::db::{connections, profiles};
use crate::error::{AppError, AppResult, Notice};
use crate::models::{IncomingRequest, Profile};
use crate::session::Session;

use super::nav::Navbar;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub connections: i64,
    pub requests: i64,
    pub rating: i64,
}

#[derive(Debug, Serialize)]
pub struct QuickLink {
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub nav: Navbar,
    pub welcome: String,
    pub profile: Profile,
    pub stats: DashboardStats,
    pub requests_headline: &'static str,
    pub requests: Vec<IncomingRequest>,
    pub quick_links: Vec<QuickLink>,
}

pub async fn dashboard(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<DashboardPage>> {
    let profile = profiles::get_profile(&db_pool, session.user_id)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;

    let requests =
        connections::list_pending_for(&db_pool, session.user_id, DASHBOARD_REQUEST_PREVIEW).await?;
    let stats = DashboardStats {
        connections: connections::count_connections(&db_pool, session.user_id).await?,
        requests: connections::count_pending_for(&db_pool, session.user_id).await?,
        rating: profile.rating,
    };

    Ok(Json(DashboardPage {
        nav: Navbar::authenticated(DASHBOARD_ROUTE),
        welcome: format!("Welcome back, {}!", profile.name),
        requests_headline: if requests.is_empty() {
            EMPTY_REQUESTS_MESSAGE
        } else {
            REQUESTS_HEADLINE
        },
        profile,
        stats,
        requests,
        quick_links: vec![
            QuickLink { label: "Find Players Nearby", href: "/players" },
            QuickLink { label: "Discover Tables", href: "/tables" },
            QuickLink { label: "Complete Your Profile", href: "/profile" },
        ],
    }))
}

pub async fn accept_request(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Notice>> {
    let accepted = connections::accept_request(&db_pool, request_id, session.user_id)
        .await?
        .ok_or(AppError::NotFound("Connection request"))?;

    tracing::info!(
        request_id = %accepted.id,
        sender_id = %accepted.sender_id,
        receiver_id = %accepted.receiver_id,
        "connection request accepted"
    );
    Ok(Json(Notice::success("Connected!", "You can now message this player")))
}
