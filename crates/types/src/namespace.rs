//! Hierarchical namespace paths.

use crate::NamespaceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A dot-separated namespace path of 1 to 3 segments, e.g. `acme.names.alice`.
///
/// Segments are lowercased on parse and restricted to `[a-z0-9_-]`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespacePath {
    segments: Vec<String>,
}

impl NamespacePath {
    /// Deepest path the ledger accepts.
    pub const MAX_DEPTH: usize = 3;

    /// Longest single segment.
    pub const MAX_SEGMENT_LEN: usize = 64;

    /// Parse and validate a dotted path.
    pub fn parse(input: &str) -> Result<Self, NamespaceError> {
        let input = input.trim();
        let segments: Vec<String> = input.split('.').map(str::to_ascii_lowercase).collect();

        if segments.len() > Self::MAX_DEPTH {
            return Err(NamespaceError::InvalidNamespaceDepth {
                path: input.to_string(),
                depth: segments.len(),
            });
        }

        for segment in &segments {
            validate_segment(input, segment)?;
        }

        Ok(Self { segments })
    }

    /// Build a path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, NamespaceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self::parse(&joined)
    }

    /// Append a child segment.
    pub fn child(&self, name: &str) -> Result<Self, NamespaceError> {
        Self::from_segments(self.segments.iter().map(String::as_str).chain([name]))
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.len() == 1
    }

    /// Path without its last segment, `None` for a root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Every prefix from the root down to (and including) this path.
    pub fn prefixes(&self) -> Vec<Self> {
        (1..=self.segments.len())
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }

    /// Ledger id of this path.
    pub fn id(&self) -> NamespaceId {
        self.segments
            .iter()
            .fold(None, |parent, segment| {
                Some(NamespaceId::derive(parent, segment))
            })
            .unwrap_or(NamespaceId::derive(None, ""))
    }
}

fn validate_segment(path: &str, segment: &str) -> Result<(), NamespaceError> {
    let invalid = |reason: &'static str| NamespaceError::InvalidNamespace {
        path: path.to_string(),
        reason,
    };
    if segment.is_empty() {
        return Err(invalid("empty segment"));
    }
    if segment.len() > NamespacePath::MAX_SEGMENT_LEN {
        return Err(invalid("segment longer than 64 characters"));
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(invalid("segment contains characters outside [a-z0-9_-]"));
    }
    Ok(())
}

impl fmt::Debug for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamespacePath({})", self)
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for NamespacePath {
    type Err = NamespaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NamespacePath::parse(s)
    }
}

impl TryFrom<String> for NamespacePath {
    type Error = NamespaceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NamespacePath::parse(&value)
    }
}

impl From<NamespacePath> for String {
    fn from(path: NamespacePath) -> Self {
        path.to_string()
    }
}

/// Namespace validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    #[error("Namespace {path:?} has {depth} levels, at most 3 are allowed")]
    InvalidNamespaceDepth { path: String, depth: usize },

    #[error("Invalid namespace {path:?}: {reason}")]
    InvalidNamespace { path: String, reason: &'static str },
}
