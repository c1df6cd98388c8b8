//! User repository for mediabroker.
//!
//! Quota mutations are expressed as relative updates so concurrent requests
//! sharing the pool cannot silently overwrite each other's deltas.

use super::user::{NewUser, User};
use super::DbPool;
use crate::quota::{self, Plan};
use crate::{BrokerError, Result};

/// Repository for user and quota operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user. The storage limit is derived from the plan.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (email, plan, storage_limit, storage_used)
             VALUES ($1, $2, $3, 0)",
        )
        .bind(&new_user.email)
        .bind(new_user.plan.as_str())
        .bind(quota::limit_for(new_user.plan) as i64)
        .execute(self.pool)
        .await
        .map_err(|e| BrokerError::Database(e.to_string()))?;

        self.get_by_email(&new_user.email)
            .await?
            .ok_or_else(|| BrokerError::UserNotFound(new_user.email.clone()))
    }

    /// Get a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, plan, storage_limit, storage_used, created_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Set the plan and re-derive the cached storage limit in one update.
    pub async fn set_plan(&self, email: &str, plan: Plan) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET plan = $1, storage_limit = $2 WHERE email = $3")
            .bind(plan.as_str())
            .bind(quota::limit_for(plan) as i64)
            .bind(email)
            .execute(self.pool)
            .await
            .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the cached storage limit (self-healing read repair).
    pub async fn set_storage_limit(&self, email: &str, limit: u64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET storage_limit = $1 WHERE email = $2")
            .bind(limit as i64)
            .bind(email)
            .execute(self.pool)
            .await
            .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Add `delta` bytes to the user's usage counter.
    ///
    /// Relative update: `used = used + delta`.
    pub async fn add_storage_used(&self, email: &str, delta: u64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET storage_used = storage_used + $1 WHERE email = $2")
                .bind(delta as i64)
                .bind(email)
                .execute(self.pool)
                .await
                .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Refund `size` bytes from the user's usage counter, floored at 0.
    ///
    /// The floor keeps a double refund or a desynced counter from driving
    /// usage negative.
    pub async fn refund_storage_used(&self, email: &str, size: u64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET storage_used = MAX(storage_used - $1, 0) WHERE email = $2",
        )
        .bind(size as i64)
        .bind(email)
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
    use crate::quota::FREE_LIMIT;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("a@x.com", Plan::Free))
            .await
            .unwrap();

        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.plan(), Plan::Free);
        assert_eq!(user.storage_limit as u64, FREE_LIMIT);
        assert_eq!(user.storage_used, 0);

        let missing = repo.get_by_email("nobody@x.com").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("a@x.com", Plan::Free))
            .await
            .unwrap();
        let result = repo.create(&NewUser::new("a@x.com", Plan::Premium)).await;

        assert!(matches!(result, Err(BrokerError::Database(_))));
    }

    #[tokio::test]
    async fn test_set_plan_rederives_limit() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("a@x.com", Plan::Free))
            .await
            .unwrap();
        assert!(repo.set_plan("a@x.com", Plan::Premium).await.unwrap());

        let user = repo.get_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.plan(), Plan::Premium);
        assert_eq!(user.storage_limit as u64, quota::limit_for(Plan::Premium));
    }

    #[tokio::test]
    async fn test_add_storage_used_is_relative() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("a@x.com", Plan::Free))
            .await
            .unwrap();
        repo.add_storage_used("a@x.com", 100).await.unwrap();
        repo.add_storage_used("a@x.com", 50).await.unwrap();

        let user = repo.get_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.storage_used, 150);
    }

    #[tokio::test]
    async fn test_refund_floors_at_zero() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("a@x.com", Plan::Free))
            .await
            .unwrap();
        repo.add_storage_used("a@x.com", 100).await.unwrap();

        repo.refund_storage_used("a@x.com", 60).await.unwrap();
        let user = repo.get_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.storage_used, 40);

        // Double refund must not go negative
        repo.refund_storage_used("a@x.com", 60).await.unwrap();
        let user = repo.get_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.storage_used, 0);
    }

    #[tokio::test]
    async fn test_updates_on_missing_user_affect_nothing() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        assert!(!repo.add_storage_used("ghost@x.com", 10).await.unwrap());
        assert!(!repo.refund_storage_used("ghost@x.com", 10).await.unwrap());
        assert!(!repo.set_plan("ghost@x.com", Plan::Custom).await.unwrap());
    }
}
