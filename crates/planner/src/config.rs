//! Planner configuration.

use bizledger_types::BlockDuration;
use serde::{Deserialize, Serialize};

/// How a namespace lookup that fails for a reason other than "not found" is
/// treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPolicy {
    /// Assume the namespace is missing and plan its registration. If it does
    /// exist the ledger rejects the bundle at announce time.
    #[default]
    FailOpen,
    /// Abort planning with the lookup error.
    FailClosed,
}

/// Configuration for namespace planning.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Treatment of transport or rejection errors during lookups.
    pub lookup_policy: LookupPolicy,

    /// Rental duration requested for newly registered root namespaces.
    pub root_duration: BlockDuration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lookup_policy: LookupPolicy::FailOpen,
            root_duration: BlockDuration(1_000_000),
        }
    }
}

impl PlannerConfig {
    /// Use the given lookup policy.
    pub fn with_lookup_policy(mut self, lookup_policy: LookupPolicy) -> Self {
        self.lookup_policy = lookup_policy;
        self
    }

    /// Use the given root rental duration.
    pub fn with_root_duration(mut self, root_duration: BlockDuration) -> Self {
        self.root_duration = root_duration;
        self
    }
}
