use clap::Parser;
use spinsync::{
    build_router, db, get_db_pool, services::GoTrueClient, utils, AppState, Config,
};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "server", about = "SpinSync HTTP server")]
struct Args {
    /// Overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Start without applying pending migrations
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;
    utils::init_logging(config.log_json);

    let pool = get_db_pool(&db::DatabaseConfig::from(&config)).await?;
    if args.skip_migrations {
        tracing::warn!("skipping database migrations");
    } else {
        db::migrations::run_migrations(&pool).await?;
    }

    let identity = Arc::new(GoTrueClient::new(&config.auth_url, &config.auth_api_key));
    let app = build_router(AppState::new(pool, identity), &config.allowed_origins);

    let port = args.port.unwrap_or(config.port);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "server running");

    axum::serve(listener, app).await?;

    Ok(())
}
