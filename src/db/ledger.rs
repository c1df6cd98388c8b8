//! Token ledger repository.
//!
//! The ledger is the source of truth for "does this file exist and who owns
//! it". Exactly one row exists per physical stored file; the token is the
//! sole external handle for rename, delete, analytics, download and
//! thumbnail operations.

use super::DbPool;
use crate::{BrokerError, Result};

/// Ledger entry linking a token to its owner, storage location and size.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileToken {
    /// Row ID.
    pub id: i64,
    /// Opaque file token.
    pub token: String,
    /// Storage location (remote-facing file path).
    pub file_path: String,
    /// Owning user's email.
    pub user_email: String,
    /// Stored size in bytes.
    pub file_size: i64,
    /// Creation timestamp.
    pub created_at: String,
}

/// New ledger entry for insertion.
#[derive(Debug, Clone)]
pub struct NewFileToken {
    /// Opaque file token.
    pub token: String,
    /// Storage location.
    pub file_path: String,
    /// Owning user's email.
    pub user_email: String,
    /// Stored size in bytes.
    pub file_size: i64,
}

/// Repository for token ledger operations.
pub struct TokenLedgerRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> TokenLedgerRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new ledger entry.
    pub async fn insert(&self, entry: &NewFileToken) -> Result<FileToken> {
        sqlx::query(
            "INSERT INTO file_tokens (token, file_path, user_email, file_size)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&entry.token)
        .bind(&entry.file_path)
        .bind(&entry.user_email)
        .bind(entry.file_size)
        .execute(self.pool)
        .await
        .map_err(|e| BrokerError::Database(e.to_string()))?;

        self.get_by_token(&entry.token)
            .await?
            .ok_or_else(|| BrokerError::FileNotFound(entry.token.clone()))
    }

    /// Get a ledger entry by token.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<FileToken>> {
        let entry = sqlx::query_as::<_, FileToken>(
            "SELECT id, token, file_path, user_email, file_size, created_at
             FROM file_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(entry)
    }

    /// Find an entry by its exact (storage location, owner) pair.
    ///
    /// The upload path uses this to detect re-uploads and reuse the
    /// existing token instead of inserting a duplicate row.
    pub async fn find_by_location(
        &self,
        file_path: &str,
        user_email: &str,
    ) -> Result<Option<FileToken>> {
        let entry = sqlx::query_as::<_, FileToken>(
            "SELECT id, token, file_path, user_email, file_size, created_at
             FROM file_tokens WHERE file_path = $1 AND user_email = $2",
        )
        .bind(file_path)
        .bind(user_email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(entry)
    }

    /// List all entries owned by a user.
    pub async fn list_by_owner(&self, user_email: &str) -> Result<Vec<FileToken>> {
        let entries = sqlx::query_as::<_, FileToken>(
            "SELECT id, token, file_path, user_email, file_size, created_at
             FROM file_tokens WHERE user_email = $1 ORDER BY created_at DESC",
        )
        .bind(user_email)
        .fetch_all(self.pool)
        .await
        .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(entries)
    }

    /// Update the storage location after a successful remote rename.
    pub async fn update_path(&self, token: &str, new_path: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE file_tokens SET file_path = $1 WHERE token = $2")
            .bind(new_path)
            .bind(token)
            .execute(self.pool)
            .await
            .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Update the stored size (re-upload to the same location).
    pub async fn update_size(&self, token: &str, file_size: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE file_tokens SET file_size = $1 WHERE token = $2")
            .bind(file_size)
            .bind(token)
            .execute(self.pool)
            .await
            .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a ledger entry.
    ///
    /// Returns `true` if the row existed.
    pub async fn delete(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM file_tokens WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await
            .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
