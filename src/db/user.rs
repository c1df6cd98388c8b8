//! User model for mediabroker.

use crate::quota::Plan;

/// User entity with quota accounting fields.
///
/// `storage_limit` is a cached derivation of `quota::limit_for(plan)`. A
/// mismatch found at read time is repaired in place by the upload path.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// User ID.
    pub id: i64,
    /// Email address (unique key).
    pub email: String,
    /// Plan name as stored ("free", "premium", "custom" or a legacy alias).
    pub plan: String,
    /// Cached storage limit in bytes.
    pub storage_limit: i64,
    /// Bytes currently accounted against the limit.
    pub storage_used: i64,
    /// Creation timestamp.
    pub created_at: String,
}

impl User {
    /// Resolve the stored plan string, applying legacy aliases.
    pub fn plan(&self) -> Plan {
        self.plan.parse().unwrap_or_default()
    }

    /// Remaining storage in bytes, floored at 0.
    pub fn remaining(&self) -> u64 {
        (self.storage_limit - self.storage_used).max(0) as u64
    }
}

/// New user for creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Initial plan.
    pub plan: Plan,
}

impl NewUser {
    /// Create a new user record with the given plan.
    pub fn new(email: impl Into<String>, plan: Plan) -> Self {
        Self {
            email: email.into(),
            plan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(plan: &str, limit: i64, used: i64) -> User {
        User {
            id: 1,
            email: "a@x.com".to_string(),
            plan: plan.to_string(),
            storage_limit: limit,
            storage_used: used,
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_plan_resolution() {
        assert_eq!(sample_user("free", 0, 0).plan(), Plan::Free);
        assert_eq!(sample_user("premium", 0, 0).plan(), Plan::Premium);
        // Legacy aliases stored by the old billing integration
        assert_eq!(sample_user("Pro", 0, 0).plan(), Plan::Premium);
        assert_eq!(sample_user("Expert", 0, 0).plan(), Plan::Custom);
        assert_eq!(sample_user("garbage", 0, 0).plan(), Plan::Free);
    }

    #[test]
    fn test_remaining() {
        assert_eq!(sample_user("free", 100, 40).remaining(), 60);
        assert_eq!(sample_user("free", 100, 100).remaining(), 0);
        // Desynced usage never reports negative remaining
        assert_eq!(sample_user("free", 100, 150).remaining(), 0);
    }
}
