use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
#[cfg(test)]
mod test;

use config::Config;
use handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::init();

    // A failure here is fatal; anything after startup is reported to
    // the caller instead.
    let pool = db::init_db_pool(&config.database_url).await?;
    db::seed_admin(&pool, &config.admin_username, &config.admin_password).await?;

    let state = Arc::new(AppState::new(pool, &config));
    let app = handlers::api_router(state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
