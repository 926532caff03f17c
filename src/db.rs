use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::config::DbConfig;

pub type Db = Pool<Postgres>;

pub async fn connect(cfg: &DbConfig) -> Result<Db> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_open_conns)
        .min_connections(cfg.min_idle_conns)
        .idle_timeout(cfg.max_idle_time())
        .max_lifetime(cfg.max_lifetime())
        .acquire_timeout(cfg.query_timeout())
        .connect(&cfg.dsn)
        .await
        .context("failed to connect to postgres")?;

    tokio::time::timeout(cfg.query_timeout(), sqlx::query("SELECT 1").execute(&pool))
        .await
        .context("database ping timed out")?
        .context("database ping failed")?;

    Ok(pool)
}

pub async fn migrate(pool: &Db) -> Result<()> {
    // crate-relative path for sqlx migrations
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
