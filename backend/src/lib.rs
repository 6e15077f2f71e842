pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use db::get_db_pool;
pub use error::{AppError, AppResult};
pub use state::AppState;
pub use utils::config::Config;

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Pages
        .route("/", get(handlers::landing))
        .route("/auth", get(handlers::auth_page))
        .route("/dashboard", get(handlers::dashboard))
        .route("/players", get(handlers::players_page))
        .route("/tables", get(handlers::tables_page))
        .route("/messaging", get(handlers::messaging_page))
        .route("/profile", get(handlers::profile_page))
        // Session lifecycle
        .route("/api/auth/signup", post(handlers::sign_up))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        // Connections
        .route("/api/connection-requests", post(handlers::send_request))
        .route(
            "/api/connection-requests/{id}/accept",
            post(handlers::accept_request),
        )
        // Tables
        .route("/api/tables", post(handlers::create_table))
        .route(
            "/api/tables/{id}",
            put(handlers::update_table).delete(handlers::delete_table),
        )
        // Messaging
        .route(
            "/api/messaging/{connection_id}/messages",
            get(handlers::thread).post(handlers::send),
        )
        .route("/api/messaging/{connection_id}/ws", get(handlers::thread_ws))
        .route("/api/unread", get(handlers::unread))
        .route("/api/unread/ws", get(handlers::unread_ws))
        .route("/api/profile", put(handlers::update_profile))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(allowed_origins)),
        )
        .with_state(state)
}

/// Explicit origins when configured, permissive otherwise.
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(false);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}
