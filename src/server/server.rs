mod error;
mod request_log;
mod routes;
mod server_config;
mod upload;

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;

use roster::{JsonStore, UserStore};

use crate::routes::AppState;
use crate::server_config::AppConfig;

const SERVER_CONFIG: &str = "resources/server.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::read(SERVER_CONFIG)
        .with_context(|| format!("failed to read app configuration {}", SERVER_CONFIG))?;

    fs::create_dir_all(&config.storage.upload_dir)
        .with_context(|| "failed to create upload directory")?;

    let store = UserStore::open(JsonStore::new(&config.storage.data_file))
        .with_context(|| format!("failed to load {}", config.storage.data_file.display()))?;
    log::info!(
        "loaded {} users from {}",
        store.len(),
        config.storage.data_file.display()
    );

    let state = AppState {
        store: Arc::new(RwLock::new(store)),
        upload_dir: config.storage.upload_dir.clone(),
        request_log: config.storage.request_log.clone(),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    log::info!("server started on {}", config.listen_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server terminated")?;

    return Ok(());
}
