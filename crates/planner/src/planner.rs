//! Namespace planner.

use crate::{LookupPolicy, PlannerConfig, PlanningSession};
use bizledger_core::{GatewayError, LedgerGateway};
use bizledger_types::{NamespaceError, NamespacePath, Operation};
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a registration was planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationReason {
    /// The ledger reported the namespace as not found.
    Missing,
    /// The lookup failed and the fail-open policy assumed it missing.
    LookupFailed(String),
}

/// A namespace that must be registered, with the operation that does it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistration {
    pub path: NamespacePath,
    pub operation: Operation,
    pub reason: RegistrationReason,
}

/// Planning failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlannerError {
    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    #[error("Looking up namespace {path} failed: {source}")]
    Lookup {
        path: NamespacePath,
        #[source]
        source: GatewayError,
    },
}

/// Decides which namespace segments still need registering.
pub struct NamespacePlanner {
    gateway: Arc<dyn LedgerGateway>,
    config: PlannerConfig,
}

impl NamespacePlanner {
    pub fn new(gateway: Arc<dyn LedgerGateway>, config: PlannerConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Parse `path` and plan it. See [`NamespacePlanner::plan_path`].
    pub async fn plan(
        &self,
        session: &mut PlanningSession,
        path: &str,
    ) -> Result<Vec<NamespaceRegistration>, PlannerError> {
        let path = NamespacePath::parse(path)?;
        self.plan_path(session, &path).await
    }

    /// Registrations needed for every prefix of `path`, root first.
    ///
    /// Prefixes already in `session` are skipped without a lookup. The
    /// session is only updated once planning succeeded as a whole.
    pub async fn plan_path(
        &self,
        session: &mut PlanningSession,
        path: &NamespacePath,
    ) -> Result<Vec<NamespaceRegistration>, PlannerError> {
        let mut registrations = Vec::new();

        for prefix in path.prefixes() {
            if session.contains(&prefix) {
                debug!(namespace = %prefix, "Namespace already planned in this session");
                continue;
            }

            let reason = match self.gateway.get_namespace(&prefix).await {
                Ok(info) => {
                    debug!(namespace = %prefix, owner = %info.owner, "Namespace exists");
                    continue;
                }
                Err(GatewayError::NotFound(_)) => RegistrationReason::Missing,
                Err(error) => match self.config.lookup_policy {
                    LookupPolicy::FailOpen => {
                        warn!(
                            namespace = %prefix,
                            error = %error,
                            "Namespace lookup failed, planning registration anyway"
                        );
                        RegistrationReason::LookupFailed(error.to_string())
                    }
                    LookupPolicy::FailClosed => {
                        return Err(PlannerError::Lookup {
                            path: prefix,
                            source: error,
                        });
                    }
                },
            };

            registrations.push(self.registration(prefix, reason));
        }

        for registration in &registrations {
            session.insert(registration.path.clone());
        }

        debug!(
            namespace = %path,
            planned = registrations.len(),
            "Planned namespace registrations"
        );
        Ok(registrations)
    }

    fn registration(&self, path: NamespacePath, reason: RegistrationReason) -> NamespaceRegistration {
        let duration = path.is_root().then_some(self.config.root_duration);
        NamespaceRegistration {
            operation: Operation::RegisterNamespace {
                path: path.clone(),
                duration,
            },
            path,
            reason,
        }
    }
}
