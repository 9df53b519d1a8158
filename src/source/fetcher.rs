// ABOUTME: Workspace fetcher: purge, shallow clone, and exact checkout of one commit.
// ABOUTME: Workspaces live at <storage_root>/<project>/<commit> and are never reused.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::auth::{CloneTarget, Credentials};
use super::error::FetchError;
use super::transport::{SourceTransport, TransportError};
use crate::types::{CommitHash, ProjectRef};

/// How long a timed-out clone gets to notice cancellation before its partial
/// workspace is removed.
const CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Materialises source trees for (project, commit) pairs.
pub struct WorkspaceFetcher<T> {
    transport: Arc<T>,
    storage_root: PathBuf,
    clone_timeout: Duration,
}

impl<T: SourceTransport> WorkspaceFetcher<T> {
    pub fn new(transport: Arc<T>, storage_root: impl Into<PathBuf>, clone_timeout: Duration) -> Self {
        let storage_root = storage_root.into();
        let storage_root = std::path::absolute(&storage_root).unwrap_or(storage_root);
        Self {
            transport,
            storage_root,
            clone_timeout,
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Deterministic workspace location for one commit.
    pub fn workspace_path(&self, project: &ProjectRef, commit: &CommitHash) -> PathBuf {
        self.storage_root
            .join(project.relative_path())
            .join(commit.as_str())
    }

    /// Fetch `commit` of `project` into a fresh workspace and return its
    /// absolute path. The caller owns the directory afterwards.
    pub async fn fetch(
        &self,
        project: &ProjectRef,
        commit: &CommitHash,
        credentials: Option<&Credentials>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, FetchError> {
        let target = CloneTarget::resolve(project, credentials)?;
        let path = self.workspace_path(project, commit);

        purge_workspace(&path).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(project = %project, commit = %commit, path = %path.display(), "cloning");
        if let Err(e) = self.clone_into(target, &path, cancel).await {
            discard_partial(&path).await;
            return Err(e);
        }

        let transport = Arc::clone(&self.transport);
        let dest = path.clone();
        let wanted = commit.clone();
        let checkout = tokio::task::spawn_blocking(move || transport.checkout(&dest, &wanted))
            .await
            .map_err(|e| FetchError::Io(std::io::Error::other(e)))?;

        match checkout {
            Ok(()) => {
                debug!(path = %path.display(), "workspace ready");
                Ok(path)
            }
            Err(TransportError::NotFound(reason)) => Err(FetchError::InvalidCommit {
                commit: commit.to_string(),
                reason,
            }),
            Err(e) => Err(FetchError::Checkout(e)),
        }
    }

    async fn clone_into(
        &self,
        target: CloneTarget,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        let clone_cancel = cancel.child_token();
        let transport = Arc::clone(&self.transport);
        let dest = path.to_path_buf();
        let token = clone_cancel.clone();

        let mut handle: JoinHandle<Result<(), TransportError>> =
            tokio::task::spawn_blocking(move || transport.clone_shallow(&target, &dest, &token));

        match tokio::time::timeout(self.clone_timeout, &mut handle).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(TransportError::Cancelled))) => Err(FetchError::Cancelled),
            Ok(Ok(Err(e))) => Err(FetchError::Clone(e)),
            Ok(Err(join)) => Err(FetchError::Io(std::io::Error::other(join))),
            Err(_) => {
                clone_cancel.cancel();
                if tokio::time::timeout(CANCEL_GRACE, &mut handle).await.is_err() {
                    warn!(path = %path.display(), "clone still running after cancellation");
                }
                Err(FetchError::CloneTimeout(self.clone_timeout))
            }
        }
    }
}

async fn purge_workspace(path: &Path) -> Result<(), FetchError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(());
    }
    debug!(path = %path.display(), "removing stale workspace");
    tokio::fs::remove_dir_all(path)
        .await
        .map_err(|source| FetchError::Purge {
            path: path.to_path_buf(),
            source,
        })
}

async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "failed to remove partial workspace");
    }
}
