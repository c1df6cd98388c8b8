//! Web server for mediabroker.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::db::Database;
use crate::file::{SidecarStore, StagingArea};
use crate::rate_limit::RateLimitConfig;
use crate::remote::RemoteStorage;
use crate::{BrokerError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: Arc<Database>, remote: Arc<dyn RemoteStorage>) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| BrokerError::Config(format!("invalid server address: {e}")))?;

        let staging = StagingArea::new(&config.storage.staging_path)?;
        let sidecar = SidecarStore::new(&config.storage.sidecar_path)?;

        let app_state = AppState::new(db, remote, staging, sidecar)
            .with_rate_limit(RateLimitConfig::new(
                config.server.upload_rate_limit,
                config.server.upload_rate_window_secs,
            ))
            .with_allowed_origins(config.server.allowed_origins.clone());

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(app_state: Arc<AppState>) -> axum::Router {
        create_router(app_state).merge(create_health_router())
    }

    /// Run the web server.
    pub async fn run(self) -> std::io::Result<()> {
        let router = Self::build_router(self.app_state);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = Self::build_router(self.app_state);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::db::Privacy;

    struct UnreachableRemote;

    #[async_trait]
    impl RemoteStorage for UnreachableRemote {
        async fn receive(&self, _: Vec<u8>, _: &str, _: &str, _: Privacy) -> Result<String> {
            Err(BrokerError::UploadFailed("unreachable".into()))
        }

        async fn rename_file(&self, _: &str, _: &str, _: &str) -> Result<String> {
            Err(BrokerError::UploadFailed("unreachable".into()))
        }

        async fn delete_file(&self, _: &str, _: &str) -> Result<()> {
            Err(BrokerError::DeletionFailed("unreachable".into()))
        }

        async fn fetch_thumbnail(&self, _: &str) -> Result<Vec<u8>> {
            Err(BrokerError::UploadFailed("unreachable".into()))
        }

        async fn delete_thumbnail(&self, _: &str) -> Result<()> {
            Err(BrokerError::DeletionFailed("unreachable".into()))
        }

        async fn issue_token(&self, _: &str, _: &str) -> Result<String> {
            Err(BrokerError::UploadFailed("unreachable".into()))
        }

        async fn resolve_download(&self, _: &str) -> Result<String> {
            Err(BrokerError::UploadFailed("unreachable".into()))
        }
    }

    fn create_test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0; // Use random port
        config.storage.staging_path = temp_dir
            .path()
            .join("staging")
            .to_string_lossy()
            .into_owned();
        config.storage.sidecar_path = temp_dir
            .path()
            .join("metadata")
            .to_string_lossy()
            .into_owned();
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(&temp_dir);
        let db = Arc::new(Database::open_in_memory().await.unwrap());

        let server = WebServer::new(&config, db, Arc::new(UnreachableRemote)).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(&temp_dir);
        let db = Arc::new(Database::open_in_memory().await.unwrap());

        let server = WebServer::new(&config, db, Arc::new(UnreachableRemote)).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        // Test health endpoint
        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");
    }
}
