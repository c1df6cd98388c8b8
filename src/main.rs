use std::sync::Arc;

use tracing::info;

use mediabroker::{Config, Database, HttpRemoteStorage, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = mediabroker::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        mediabroker::logging::init_console_only(&config.logging.level);
    }

    info!("mediabroker - storage quota and file token broker");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let remote = match HttpRemoteStorage::new(&config.remote) {
        Ok(remote) => Arc::new(remote),
        Err(e) => {
            tracing::error!("Failed to build remote storage client: {}", e);
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(&config, db, remote) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to build web server: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    if let Err(e) = server.run().await {
        tracing::error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
