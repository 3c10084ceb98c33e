//! Per-command planning memory.

use bizledger_types::NamespacePath;
use indexmap::IndexSet;

/// Namespace paths already scheduled for registration during one command.
///
/// Create one per command invocation and pass it by `&mut` to every planning
/// and composing call of that command. Iteration yields paths in the order
/// they were scheduled.
#[derive(Debug, Default, Clone)]
pub struct PlanningSession {
    planned: IndexSet<NamespacePath>,
}

impl PlanningSession {
    /// Create a new empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a path was already scheduled.
    pub fn contains(&self, path: &NamespacePath) -> bool {
        self.planned.contains(path)
    }

    /// Record a path. Returns `false` if it was already recorded.
    pub fn insert(&mut self, path: NamespacePath) -> bool {
        self.planned.insert(path)
    }

    /// Scheduled paths in scheduling order.
    pub fn planned(&self) -> impl Iterator<Item = &NamespacePath> {
        self.planned.iter()
    }

    pub fn len(&self) -> usize {
        self.planned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planned.is_empty()
    }
}
