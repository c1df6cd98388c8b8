//! File metadata repository.
//!
//! The analytics/presentation-facing record for a token. Decoupled from the
//! ledger: a row may be created out of band (e.g. by the encoding pipeline)
//! before or after ledger insertion, so every write path is an upsert.

use std::fmt;
use std::str::FromStr;

use super::DbPool;
use crate::{BrokerError, Result};

/// File privacy setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Privacy {
    /// Publicly listable.
    #[default]
    Public,
    /// Owner-only.
    Private,
}

impl Privacy {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Privacy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "private" => Privacy::Private,
            _ => Privacy::Public,
        })
    }
}

/// File metadata entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileMeta {
    /// Row ID.
    pub id: i64,
    /// File token (unique, matches the ledger by value).
    pub token: String,
    /// Size in bytes.
    pub size: i64,
    /// Privacy setting as stored.
    pub privacy: String,
    /// View counter.
    pub views: i64,
    /// Creation timestamp.
    pub created_at: String,
}

impl FileMeta {
    /// Resolve the stored privacy string.
    pub fn privacy(&self) -> Privacy {
        self.privacy.parse().unwrap_or_default()
    }
}

/// Repository for file metadata operations.
pub struct FileMetaRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileMetaRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get a metadata row by token.
    pub async fn get(&self, token: &str) -> Result<Option<FileMeta>> {
        let meta = sqlx::query_as::<_, FileMeta>(
            "SELECT id, token, size, privacy, views, created_at
             FROM file_meta WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(meta)
    }

    /// Insert or update the row for a token.
    ///
    /// Existence is re-checked immediately before the insert: the row may
    /// have been created by an unrelated path (out-of-band registration)
    /// between the caller's earlier read and now.
    pub async fn upsert(&self, token: &str, size: i64, privacy: Privacy) -> Result<FileMeta> {
        if self.get(token).await?.is_some() {
            sqlx::query("UPDATE file_meta SET size = $1, privacy = $2 WHERE token = $3")
                .bind(size)
                .bind(privacy.as_str())
                .bind(token)
                .execute(self.pool)
                .await
                .map_err(|e| BrokerError::Database(e.to_string()))?;
        } else {
            sqlx::query(
                "INSERT INTO file_meta (token, size, privacy, views)
                 VALUES ($1, $2, $3, 0)
                 ON CONFLICT(token) DO UPDATE SET size = excluded.size, privacy = excluded.privacy",
            )
            .bind(token)
            .bind(size)
            .bind(privacy.as_str())
            .execute(self.pool)
            .await
            .map_err(|e| BrokerError::Database(e.to_string()))?;
        }

        self.get(token)
            .await?
            .ok_or_else(|| BrokerError::FileNotFound(token.to_string()))
    }

    /// Atomically increment the view counter, returning the new value.
    pub async fn increment_views(&self, token: &str) -> Result<Option<i64>> {
        let views: Option<i64> = sqlx::query_scalar(
            "UPDATE file_meta SET views = views + 1 WHERE token = $1 RETURNING views",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(views)
    }

    /// Delete the row for a token.
    pub async fn delete(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM file_meta WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await
            .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = FileMetaRepository::new(db.pool());

        let created = repo.upsert("tok-1", 100, Privacy::Public).await.unwrap();
        assert_eq!(created.size, 100);
        assert_eq!(created.privacy(), Privacy::Public);
        assert_eq!(created.views, 0);

        let updated = repo.upsert("tok-1", 250, Privacy::Private).await.unwrap();
        assert_eq!(updated.size, 250);
        assert_eq!(updated.privacy(), Privacy::Private);
        // Update, not a second row: id and view counter are preserved
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.views, 0);
    }

    #[tokio::test]
    async fn test_upsert_is_independent_of_ledger() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = FileMetaRepository::new(db.pool());

        // No ledger row exists for this token; the meta row is still created
        let meta = repo.upsert("orphan", 5, Privacy::Public).await.unwrap();
        assert_eq!(meta.token, "orphan");
    }

    #[tokio::test]
    async fn test_increment_views() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = FileMetaRepository::new(db.pool());

        repo.upsert("tok-1", 1, Privacy::Public).await.unwrap();

        assert_eq!(repo.increment_views("tok-1").await.unwrap(), Some(1));
        assert_eq!(repo.increment_views("tok-1").await.unwrap(), Some(2));
        assert_eq!(repo.increment_views("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = FileMetaRepository::new(db.pool());

        repo.upsert("tok-1", 1, Privacy::Public).await.unwrap();

        assert!(repo.delete("tok-1").await.unwrap());
        assert!(repo.get("tok-1").await.unwrap().is_none());
        assert!(!repo.delete("tok-1").await.unwrap());
    }

    #[test]
    fn test_privacy_parsing() {
        assert_eq!("private".parse::<Privacy>().unwrap(), Privacy::Private);
        assert_eq!("PRIVATE".parse::<Privacy>().unwrap(), Privacy::Private);
        assert_eq!("public".parse::<Privacy>().unwrap(), Privacy::Public);
        assert_eq!("anything".parse::<Privacy>().unwrap(), Privacy::Public);
    }
}
