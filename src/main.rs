use clap::Parser;
use std::env;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use runda::config::Config;
use runda::db;
use runda::repository::CourseRepository;
use runda::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "runda=debug,tower_http=info".into())
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::parse();

    let pool = db::connect(&cfg.db).await?;
    tracing::info!("database connection pool established");

    if cfg.db.automigrate {
        db::migrate(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let state = AppState {
        courses: CourseRepository::new(pool, cfg.db.query_timeout()),
        env: cfg.env,
    };

    let app = routes::with_middleware(routes::router(state), routes::REQUEST_TIMEOUT);

    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, env = cfg.env.as_str(), base_url = %cfg.base_url, "starting server");

    axum::serve(listener, app).await?;
    Ok(())
}
