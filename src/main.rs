mod app;
mod auth;
mod config;
mod db;
mod error;
mod images;
mod ingredients;
#[cfg(test)]
mod memory;
mod pagination;
mod presenter;
mod recipes;
mod state;
mod storage;
mod store;
mod tags;
mod users;
mod validation;

use crate::config::AppConfig;
use crate::db::PgStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "foodgram=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let pool = db::connect(&config).await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let state = AppState::init(config, PgStore::new(pool)).await?;
    app::serve(app::build_app(state)).await
}
