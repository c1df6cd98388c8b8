//! Rename flow.
//!
//! The sidecar is rewritten before the remote call. If the remote rename
//! then fails, the local display name diverges from the remote one; this is
//! a known accepted limitation of the workflow, not rolled back.

use tracing::{info, warn};

use crate::db::{DbPool, TokenLedgerRepository};
use crate::remote::RemoteStorage;
use crate::{BrokerError, Result};

use super::sidecar::SidecarStore;
use super::storage_location;

/// Result of a completed rename.
#[derive(Debug, Clone)]
pub struct RenameOutcome {
    /// The file token.
    pub token: String,
    /// The new filename.
    pub file_name: String,
}

/// Coordinator for the rename workflow.
pub struct RenameCoordinator<'a, R: RemoteStorage> {
    pool: &'a DbPool,
    remote: &'a R,
    sidecar: &'a SidecarStore,
}

impl<'a, R: RemoteStorage> RenameCoordinator<'a, R> {
    /// Create a new coordinator over the injected collaborators.
    pub fn new(pool: &'a DbPool, remote: &'a R, sidecar: &'a SidecarStore) -> Self {
        Self {
            pool,
            remote,
            sidecar,
        }
    }

    /// Rename the file identified by `token` to `new_name`.
    ///
    /// The operation is complete only once the remote rename succeeds; the
    /// ledger location is updated last so the re-upload check stays
    /// coherent with what the remote actually stores.
    pub async fn rename(&self, token: &str, new_name: &str) -> Result<RenameOutcome> {
        let ledger = TokenLedgerRepository::new(self.pool);

        let entry = ledger
            .get_by_token(token)
            .await?
            .ok_or_else(|| BrokerError::FileNotFound(token.to_string()))?;

        let old_name = entry
            .file_path
            .rsplit('/')
            .next()
            .unwrap_or(&entry.file_path)
            .to_string();

        // Sidecar first. If the remote call below fails the local name has
        // already diverged; accepted trade-off.
        match self.sidecar.rename(&entry.user_email, &old_name, new_name) {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    "no sidecar record for {} while renaming token {}",
                    old_name, token
                );
            }
            Err(e) => warn!("sidecar rename failed for {}: {}", old_name, e),
        }

        self.remote
            .rename_file(token, new_name, &entry.user_email)
            .await?;

        let new_location = storage_location(&entry.user_email, new_name);
        ledger.update_path(token, &new_location).await?;

        info!(
            email = %entry.user_email,
            token = %token,
            from = %old_name,
            to = %new_name,
            "rename complete"
        );

        Ok(RenameOutcome {
            token: token.to_string(),
            file_name: new_name.to_string(),
        })
    }
}
