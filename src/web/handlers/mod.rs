//! API handlers for the Web surface.

pub mod files;
pub mod upload;
pub mod user;

pub use files::*;
pub use upload::*;
pub use user::*;

use std::sync::Arc;

use crate::db::Database;
use crate::file::{SidecarStore, StagingArea};
use crate::rate_limit::{RateLimitConfig, UploadRateLimiter};
use crate::remote::RemoteStorage;

/// Shared application state for all handlers.
pub struct AppState {
    /// Database handle.
    pub db: Arc<Database>,
    /// Remote storage client.
    pub remote: Arc<dyn RemoteStorage>,
    /// Upload staging area.
    pub staging: StagingArea,
    /// Sidecar metadata store.
    pub sidecar: SidecarStore,
    /// Upload rate limiter, keyed by client address.
    pub upload_limiter: UploadRateLimiter,
    /// Allowed request origins. Empty disables the origin check.
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Create application state over the injected collaborators.
    pub fn new(
        db: Arc<Database>,
        remote: Arc<dyn RemoteStorage>,
        staging: StagingArea,
        sidecar: SidecarStore,
    ) -> Self {
        Self {
            db,
            remote,
            staging,
            sidecar,
            upload_limiter: UploadRateLimiter::new(RateLimitConfig::default()),
            allowed_origins: Vec::new(),
        }
    }

    /// Set the upload rate limit.
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.upload_limiter = UploadRateLimiter::new(config);
        self
    }

    /// Set the allowed origins.
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }
}
