// ABOUTME: Error type for workspace fetching.
// ABOUTME: Separates host, purge, clone, timeout, and bad-commit failures.

use std::path::PathBuf;
use std::time::Duration;

use super::transport::TransportError;

/// Errors from materialising a workspace.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The project host has no known clone URL scheme.
    #[error("unsupported source host for {project} (only github.com is recognised)")]
    UnsupportedHost { project: String },

    /// A stale workspace could not be removed before cloning.
    #[error("failed to clear stale workspace {}: {source}", path.display())]
    Purge {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transport failed to clone (auth, network, repository errors).
    #[error("clone failed: {0}")]
    Clone(#[source] TransportError),

    /// The clone did not finish within the clone timeout.
    #[error("clone timed out after {}s", .0.as_secs())]
    CloneTimeout(Duration),

    /// The requested commit is not reachable in the fetched history.
    #[error("commit {commit} cannot be checked out: {reason}")]
    InvalidCommit { commit: String, reason: String },

    /// Checkout failed for a reason other than a missing commit.
    #[error("checkout failed: {0}")]
    Checkout(#[source] TransportError),

    /// The surrounding run was cancelled.
    #[error("fetch cancelled")]
    Cancelled,

    #[error("workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}
