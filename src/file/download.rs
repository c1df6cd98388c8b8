//! Download gating and file analytics.
//!
//! Gating is a pure authorization decision layered in front of the remote
//! service: token, owner and plan are re-resolved on every call, so a plan
//! change between two calls takes effect immediately.

use tracing::warn;

use crate::db::{DbPool, FileMetaRepository, TokenLedgerRepository, UserRepository};
use crate::quota::Plan;
use crate::remote::RemoteStorage;
use crate::{BrokerError, Result};

/// Analytics view of a stored file.
#[derive(Debug, Clone)]
pub struct FileAnalytics {
    /// The file token.
    pub token: String,
    /// Owning user's email.
    pub owner_email: String,
    /// Size in bytes.
    pub size: i64,
    /// Privacy setting.
    pub privacy: String,
    /// View counter.
    pub views: i64,
    /// Creation timestamp.
    pub created_at: String,
}

/// Plan-gated access to remote downloads and thumbnails.
pub struct DownloadGate<'a, R: RemoteStorage> {
    pool: &'a DbPool,
    remote: &'a R,
}

impl<'a, R: RemoteStorage> DownloadGate<'a, R> {
    /// Create a new gate over the injected collaborators.
    pub fn new(pool: &'a DbPool, remote: &'a R) -> Self {
        Self { pool, remote }
    }

    /// Resolve the owner's plan for a token.
    async fn resolve_plan(&self, token: &str) -> Result<(String, Plan)> {
        let ledger = TokenLedgerRepository::new(self.pool);
        let users = UserRepository::new(self.pool);

        let entry = ledger
            .get_by_token(token)
            .await?
            .ok_or_else(|| BrokerError::FileNotFound(token.to_string()))?;

        let user = users
            .get_by_email(&entry.user_email)
            .await?
            .ok_or_else(|| BrokerError::UserNotFound(entry.user_email.clone()))?;

        Ok((entry.user_email, user.plan()))
    }

    /// Produce a remote download URL for the token.
    ///
    /// Refused with `Forbidden` for the Free plan. No side effects, and the
    /// decision is never cached.
    pub async fn initiate_download(&self, token: &str) -> Result<String> {
        let (owner, plan) = self.resolve_plan(token).await?;

        if !plan.can_download() {
            return Err(BrokerError::Forbidden(format!(
                "downloads are not available on the {plan} plan ({owner})"
            )));
        }

        self.remote.resolve_download(token).await
    }

    /// Fetch the thumbnail for a token and count the view.
    pub async fn thumbnail(&self, token: &str) -> Result<Vec<u8>> {
        let ledger = TokenLedgerRepository::new(self.pool);
        ledger
            .get_by_token(token)
            .await?
            .ok_or_else(|| BrokerError::FileNotFound(token.to_string()))?;

        let bytes = self.remote.fetch_thumbnail(token).await?;

        // View accounting is best-effort; a missing meta row is tolerated
        let meta = FileMetaRepository::new(self.pool);
        if let Err(e) = meta.increment_views(token).await {
            warn!("failed to count view for token {}: {}", token, e);
        }

        Ok(bytes)
    }

    /// Remove the remote thumbnail for a token. No local state changes.
    pub async fn delete_thumbnail(&self, token: &str) -> Result<()> {
        let ledger = TokenLedgerRepository::new(self.pool);
        ledger
            .get_by_token(token)
            .await?
            .ok_or_else(|| BrokerError::FileNotFound(token.to_string()))?;

        self.remote.delete_thumbnail(token).await
    }

    /// Read the analytics record for a token.
    pub async fn analytics(&self, token: &str) -> Result<FileAnalytics> {
        let ledger = TokenLedgerRepository::new(self.pool);
        let meta = FileMetaRepository::new(self.pool);

        let entry = ledger
            .get_by_token(token)
            .await?
            .ok_or_else(|| BrokerError::FileNotFound(token.to_string()))?;

        // The meta row may not exist yet (ledger-first creation order)
        let row = meta.get(token).await?;

        Ok(match row {
            Some(row) => FileAnalytics {
                token: entry.token,
                owner_email: entry.user_email,
                size: row.size,
                privacy: row.privacy,
                views: row.views,
                created_at: row.created_at,
            },
            None => FileAnalytics {
                token: entry.token,
                owner_email: entry.user_email,
                size: entry.file_size,
                privacy: "public".to_string(),
                views: 0,
                created_at: entry.created_at,
            },
        })
    }
}
