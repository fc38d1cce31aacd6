//! Error types for hierarchy loading, index building and selection resolution.

use thiserror::Error;

use crate::node::NodeId;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a filter session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend or network failure while fetching rows.
    #[error("fetch failed ({context}): {message}")]
    Fetch {
        /// What was being fetched (root level, children of a node, leaves).
        context: String,
        /// Message reported by the backend.
        message: String,
    },

    /// A backend request did not answer within the configured timeout.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// A row whose `CHILDREN` or `PATH` encoding cannot be decoded.
    #[error("malformed row {node:?}: {reason}")]
    MalformedRow {
        /// `RESULT_NODE` of the offending row (may be empty).
        node: String,
        /// Decoder message.
        reason: String,
    },

    /// The node id does not belong to the current tree.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// A fetch completed for a dialog session that has since been closed.
    #[error("stale session generation {found} (current {expected})")]
    StaleSession {
        /// Generation of the live session.
        expected: u64,
        /// Generation carried by the completed request.
        found: u64,
    },

    /// Building the dependent index failed; level loads fall back to parent filters.
    #[error("dependent index build failed: {0}")]
    IndexBuild(Box<Error>),
}

impl Error {
    /// Create a fetch error.
    pub fn fetch(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a malformed row error.
    pub fn malformed(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Attaches the offending row key to a [`Error::MalformedRow`].
    #[must_use]
    pub(crate) fn for_node(self, node: &str) -> Self {
        match self {
            Self::MalformedRow { reason, .. } => Self::malformed(node, reason),
            other => other,
        }
    }

    /// Returns `true` if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { .. } | Self::Timeout(_) => true,
            Self::IndexBuild(inner) => inner.is_retryable(),
            Self::MalformedRow { .. } | Self::UnknownNode(_) | Self::StaleSession { .. } => false,
        }
    }
}
