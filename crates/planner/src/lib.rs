//! Namespace registration planning.
//!
//! Given a dotted path such as `acme.identities.alice`, the planner decides
//! which of its prefixes still need a registration operation. Paths already
//! scheduled earlier in the same [`PlanningSession`] are skipped, so composing
//! several bundles in one command never registers the same namespace twice.

mod config;
mod planner;
mod session;

pub use config::{LookupPolicy, PlannerConfig};
pub use planner::{NamespacePlanner, NamespaceRegistration, PlannerError, RegistrationReason};
pub use session::PlanningSession;
