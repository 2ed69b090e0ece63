pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] db::DbError),
    #[error("Server error: {0}")]
    Server(String),
}

pub async fn run(config_path: &str) -> Result<(), ServerError> {
    let config = config::Config::load(config_path)?;

    let db_path = config.database_path();
    info!("Opening database at {}", db_path);
    let db = Arc::new(db::SqliteRepository::new(&db_path).await?);

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = config.listen.port.clone();
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let state = server::AppState::new(config, db);
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

    info!("Movie Master is listening on port {}", port);

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;

    Ok(())
}
