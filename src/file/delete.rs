//! Deletion coordinator.
//!
//! Remote delete gates every local mutation: if the remote call fails the
//! ledger row and quota stay untouched, so a retry is safe and the quota
//! cannot drift for a file that may still exist remotely.

use tracing::{info, warn};

use crate::db::{DbPool, FileMetaRepository, TokenLedgerRepository, UserRepository};
use crate::remote::RemoteStorage;
use crate::{BrokerError, Result};

use super::sidecar::SidecarStore;

/// Result of a completed deletion.
#[derive(Debug, Clone)]
pub struct DeletionOutcome {
    /// Owner of the deleted file.
    pub owner_email: String,
    /// Bytes refunded to the owner's quota.
    pub bytes_freed: u64,
}

/// Coordinator for the deletion workflow.
pub struct DeletionCoordinator<'a, R: RemoteStorage> {
    pool: &'a DbPool,
    remote: &'a R,
    sidecar: &'a SidecarStore,
}

impl<'a, R: RemoteStorage> DeletionCoordinator<'a, R> {
    /// Create a new coordinator over the injected collaborators.
    pub fn new(pool: &'a DbPool, remote: &'a R, sidecar: &'a SidecarStore) -> Self {
        Self {
            pool,
            remote,
            sidecar,
        }
    }

    /// Delete the file identified by `token`.
    ///
    /// A second call for the same token returns `FileNotFound`: the ledger
    /// row is gone, so the refund can never be applied twice.
    pub async fn delete(&self, token: &str) -> Result<DeletionOutcome> {
        let ledger = TokenLedgerRepository::new(self.pool);
        let users = UserRepository::new(self.pool);
        let meta = FileMetaRepository::new(self.pool);

        let entry = ledger
            .get_by_token(token)
            .await?
            .ok_or_else(|| BrokerError::FileNotFound(token.to_string()))?;

        // Sidecar removal is best-effort; a stale cache entry is tolerated
        match self.sidecar.find_by_token(&entry.user_email, token) {
            Ok(Some(record)) => {
                if let Err(e) = self.sidecar.remove(&entry.user_email, &record.file_name) {
                    warn!("failed to remove sidecar for {}: {}", record.file_name, e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("sidecar lookup failed for token {}: {}", token, e),
        }

        // Remote delete must succeed before any local state changes
        self.remote
            .delete_file(token, &entry.user_email)
            .await
            .map_err(|e| BrokerError::DeletionFailed(e.to_string()))?;

        ledger.delete(token).await?;

        let bytes_freed = entry.file_size.max(0) as u64;
        users
            .refund_storage_used(&entry.user_email, bytes_freed)
            .await?;

        if let Err(e) = meta.delete(token).await {
            warn!("failed to remove file_meta for token {}: {}", token, e);
        }

        info!(
            email = %entry.user_email,
            token = %token,
            bytes_freed,
            "deletion complete"
        );

        Ok(DeletionOutcome {
            owner_email: entry.user_email,
            bytes_freed,
        })
    }
}
