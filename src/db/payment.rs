//! Read-only access to the payments table.
//!
//! The table schema is owned by the payment gateway integration; this
//! repository only reads the latest row for an email to resolve plan
//! upgrades.

use super::DbPool;
use crate::{BrokerError, Result};

/// Payment record as written by the gateway integration.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Payment {
    /// Row ID.
    pub id: i64,
    /// Paying user's email.
    pub email: String,
    /// Purchased product name (maps to a plan).
    pub product: String,
    /// Payment timestamp.
    pub created_at: String,
}

/// Read-only repository for payment lookups.
pub struct PaymentRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get the most recent payment for an email, if any.
    pub async fn latest_for_email(&self, email: &str) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT id, email, product, created_at
             FROM payments WHERE email = $1
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BrokerError::Database(e.to_string()))?;

        Ok(payment)
    }
}
