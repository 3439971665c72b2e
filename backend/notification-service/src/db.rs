use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use sqlx::migrate::Migrator;
use sqlx::{Pool, Postgres};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn init_pool(
    database_url: &str,
    run_migrations: bool,
) -> Result<Pool<Postgres>, sqlx::Error> {
    let cfg = DbPoolConfig::for_service("notification-service", database_url);
    cfg.log_config();
    let pool = create_pg_pool(cfg).await?;
    if run_migrations {
        MIGRATOR.run(&pool).await?;
        tracing::info!("notification-service migrations applied");
    }
    Ok(pool)
}
