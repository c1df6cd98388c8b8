//! Storage quota policy.
//!
//! The single place where a plan maps to a storage limit. Both the
//! quota-enforcement path and the cached-limit repair path go through
//! [`limit_for`].

use std::fmt;
use std::str::FromStr;

/// Subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Plan {
    /// Free tier.
    #[default]
    Free,
    /// Paid tier.
    Premium,
    /// Negotiated tier.
    Custom,
}

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Storage limit for the Free plan.
pub const FREE_LIMIT: u64 = 500 * MIB;
/// Storage limit for the Premium plan.
pub const PREMIUM_LIMIT: u64 = 50 * GIB;
/// Storage limit for the Custom plan.
pub const CUSTOM_LIMIT: u64 = 200 * GIB;

impl Plan {
    /// Convert plan to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
            Plan::Custom => "custom",
        }
    }

    /// Whether this plan allows direct downloads.
    pub fn can_download(&self) -> bool {
        !matches!(self, Plan::Free)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Plan {
    type Err = std::convert::Infallible;

    /// Parse a plan name, resolving legacy aliases.
    ///
    /// `Pro` is an alias of `Premium` and `Expert` an alias of `Custom`;
    /// anything unrecognized falls back to `Free`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "premium" | "pro" => Plan::Premium,
            "custom" | "expert" => Plan::Custom,
            _ => Plan::Free,
        })
    }
}

/// Storage limit in bytes for the given plan.
///
/// Deterministic and total: every plan has exactly one limit.
pub fn limit_for(plan: Plan) -> u64 {
    match plan {
        Plan::Free => FREE_LIMIT,
        Plan::Premium => PREMIUM_LIMIT,
        Plan::Custom => CUSTOM_LIMIT,
    }
}
