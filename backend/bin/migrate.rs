use spinsync::db::{get_db_pool, migrations::run_migrations, DatabaseConfig};
use spinsync::utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging(false);

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    tracing::info!(url = %db_config.database_url, "running database migrations");
    run_migrations(&pool).await?;
    pool.close().await;

    Ok(())
}
