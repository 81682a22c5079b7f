mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::routes::AppState;
use crate::services::seed_service::SeedService;
use crate::services::storage::LocalDiskStorage;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    tracing::info!("connecting to database");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(io::Error::other)?;
    db::create_schema(&db).await.map_err(io::Error::other)?;
    tracing::info!("database ready");

    if config.seed_demo_data {
        let inserted = SeedService::seed_demo_data(&db).await.map_err(|e| io::Error::other(e.to_string()))?;
        tracing::info!(inserted, "demo students seeded");
    }

    std::fs::create_dir_all(&config.upload_dir)?;
    let storage = Arc::new(LocalDiskStorage::new(config.upload_dir.clone()));

    let bind = (config.host.clone(), config.port);
    tracing::info!(host = %bind.0, port = bind.1, upload_dir = %storage.root().display(), "starting server");

    let state = AppState::new(db, config, storage);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .configure(routes::configure_app(state.clone()))
    })
    .bind(bind)?
    .run()
    .await
}
