//! Upload coordinator.
//!
//! Orchestrates the upload saga: quota check, local stage, remote transfer,
//! ledger/metadata reconciliation, quota update, cleanup. The steps span the
//! local disk, the relational store and the remote service, so there is no
//! atomic rollback; each failure path purges the staged copy and nothing
//! else.

use std::path::Path;

use tracing::{info, warn};

use crate::db::{
    DbPool, FileMetaRepository, NewFileToken, Privacy, TokenLedgerRepository, UserRepository,
};
use crate::quota::{self, Plan};
use crate::remote::RemoteStorage;
use crate::{BrokerError, Result};

use super::sidecar::{SidecarRecord, SidecarStore};
use super::staging::StagingArea;
use super::{is_allowed_media, storage_location};

/// Request data for an upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Owning user's email.
    pub owner_email: String,
    /// Original filename.
    pub file_name: String,
    /// Size the client declared for the quota check.
    pub declared_size: u64,
    /// Privacy setting for the stored file.
    pub privacy: Privacy,
    /// Uploaded bytes.
    pub content: Vec<u8>,
}

impl UploadRequest {
    /// Create a new upload request. The declared size defaults to the
    /// actual content length.
    pub fn new(owner_email: impl Into<String>, file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            owner_email: owner_email.into(),
            file_name: file_name.into(),
            declared_size: content.len() as u64,
            privacy: Privacy::Public,
            content,
        }
    }

    /// Set the declared size.
    pub fn with_declared_size(mut self, declared_size: u64) -> Self {
        self.declared_size = declared_size;
        self
    }

    /// Set the privacy.
    pub fn with_privacy(mut self, privacy: Privacy) -> Self {
        self.privacy = privacy;
        self
    }
}

/// Result of a completed upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// The file token (new, or reused on re-upload).
    pub token: String,
    /// Resolved plan.
    pub plan: Plan,
    /// Bytes accounted after the upload.
    pub storage_used: u64,
    /// Storage limit after the (possibly repaired) read.
    pub storage_limit: u64,
    /// Remaining bytes after the upload.
    pub remaining: u64,
    /// Current privacy of the stored file.
    pub privacy: Privacy,
    /// Current view count.
    pub views: i64,
    /// Whether an existing ledger entry was updated rather than inserted.
    pub updated: bool,
}

/// Coordinator for the multi-step upload workflow.
pub struct UploadCoordinator<'a, R: RemoteStorage> {
    pool: &'a DbPool,
    remote: &'a R,
    staging: &'a StagingArea,
    sidecar: &'a SidecarStore,
}

impl<'a, R: RemoteStorage> UploadCoordinator<'a, R> {
    /// Create a new coordinator over the injected collaborators.
    pub fn new(
        pool: &'a DbPool,
        remote: &'a R,
        staging: &'a StagingArea,
        sidecar: &'a SidecarStore,
    ) -> Self {
        Self {
            pool,
            remote,
            staging,
            sidecar,
        }
    }

    /// Run the upload saga.
    ///
    /// Precondition failures (`UserNotFound`, `QuotaExceeded`,
    /// `UnsupportedType`) and remote transfer failures (`UploadFailed`)
    /// leave no ledger or metadata mutation behind; the staged copy is
    /// purged on every exit path.
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome> {
        let users = UserRepository::new(self.pool);
        let ledger = TokenLedgerRepository::new(self.pool);
        let meta = FileMetaRepository::new(self.pool);

        // Bytes land on local disk first; validation failures below must
        // purge this copy on the way out.
        let staged = self
            .staging
            .stage(&request.owner_email, &request.file_name, &request.content)?;

        let user = match users.get_by_email(&request.owner_email).await? {
            Some(user) => user,
            None => {
                self.purge_staged(&staged);
                return Err(BrokerError::UserNotFound(request.owner_email.clone()));
            }
        };

        // Self-healing read: the cached limit must equal the policy value
        let plan = user.plan();
        let expected_limit = quota::limit_for(plan);
        let mut storage_limit = user.storage_limit.max(0) as u64;
        if storage_limit != expected_limit {
            warn!(
                email = %user.email,
                cached = storage_limit,
                expected = expected_limit,
                "repairing cached storage limit"
            );
            users.set_storage_limit(&user.email, expected_limit).await?;
            storage_limit = expected_limit;
        }

        let remaining = storage_limit.saturating_sub(user.storage_used.max(0) as u64);
        if request.declared_size > remaining {
            self.purge_staged(&staged);
            return Err(BrokerError::QuotaExceeded {
                remaining,
                attempted: request.declared_size,
            });
        }

        if !is_allowed_media(&request.file_name) {
            self.purge_staged(&staged);
            let ext = super::file_extension(&request.file_name).unwrap_or_default();
            return Err(BrokerError::UnsupportedType(ext));
        }

        // Remote transfer. On transport failure nothing has been written to
        // the ledger or metadata yet, so purging the staged copy restores
        // the pre-upload state.
        let remote_token = match self
            .remote
            .receive(
                request.content.clone(),
                &request.owner_email,
                &request.file_name,
                request.privacy,
            )
            .await
        {
            Ok(token) => token,
            Err(e) => {
                self.purge_staged(&staged);
                return Err(BrokerError::UploadFailed(e.to_string()));
            }
        };

        let actual_size = request.content.len() as u64;
        let location = storage_location(&request.owner_email, &request.file_name);

        // Token determination: a ledger entry for this exact (location,
        // owner) pair means re-upload. Reuse its token and account only the
        // size difference so a retry never double-counts.
        let existing = ledger
            .find_by_location(&location, &request.owner_email)
            .await?;
        let (token, updated) = match existing {
            Some(entry) => {
                ledger.update_size(&entry.token, actual_size as i64).await?;
                users
                    .refund_storage_used(&request.owner_email, entry.file_size.max(0) as u64)
                    .await?;
                (entry.token, true)
            }
            None => {
                ledger
                    .insert(&NewFileToken {
                        token: remote_token.clone(),
                        file_path: location.clone(),
                        user_email: request.owner_email.clone(),
                        file_size: actual_size as i64,
                    })
                    .await?;
                (remote_token, false)
            }
        };

        // The meta row may already exist from out-of-band registration;
        // upsert re-checks immediately before inserting.
        let meta_row = meta
            .upsert(&token, actual_size as i64, request.privacy)
            .await?;

        // Local disk is never the long-term store
        self.purge_staged(&staged);

        // Best-effort-idempotent quota update: the delta already accounts
        // for a refunded previous size on the re-upload path.
        users
            .add_storage_used(&request.owner_email, actual_size)
            .await?;

        self.refresh_sidecar(request, actual_size as i64, &token);

        let updated_user = users
            .get_by_email(&request.owner_email)
            .await?
            .ok_or_else(|| BrokerError::UserNotFound(request.owner_email.clone()))?;
        let storage_used = updated_user.storage_used.max(0) as u64;

        info!(
            email = %request.owner_email,
            token = %token,
            size = actual_size,
            updated,
            "upload complete"
        );

        Ok(UploadOutcome {
            token,
            plan,
            storage_used,
            storage_limit,
            remaining: storage_limit.saturating_sub(storage_used),
            privacy: meta_row.privacy(),
            views: meta_row.views,
            updated,
        })
    }

    fn purge_staged(&self, staged: &Path) {
        if let Err(e) = self.staging.purge(staged) {
            warn!("failed to purge staged file {:?}: {}", staged, e);
        }
    }

    fn refresh_sidecar(&self, request: &UploadRequest, size: i64, token: &str) {
        let record = match self.sidecar.read(&request.owner_email, &request.file_name) {
            Ok(Some(mut existing)) => {
                existing.file_size = size;
                existing.token = token.to_string();
                existing.update_date = chrono::Utc::now().to_rfc3339();
                existing
            }
            Ok(None) => SidecarRecord::new(&request.file_name, &request.owner_email, size, token),
            Err(e) => {
                // The sidecar is a cache; a stale or unreadable entry is
                // replaced, never fatal
                warn!("unreadable sidecar for {}: {}", request.file_name, e);
                SidecarRecord::new(&request.file_name, &request.owner_email, size, token)
            }
        };

        if let Err(e) = self.sidecar.write(&record) {
            warn!("failed to write sidecar for {}: {}", request.file_name, e);
        }
    }
}
