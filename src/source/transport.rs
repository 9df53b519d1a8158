// ABOUTME: Source transport contract and the libgit2-backed implementation.
// ABOUTME: Shallow clone with submodules, then a forced detached checkout of one commit.

use std::cell::Cell;
use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    Cred, ErrorClass, ErrorCode, FetchOptions, RemoteCallbacks, Repository,
    SubmoduleUpdateOptions,
};
use tokio_util::sync::CancellationToken;

use super::auth::{BasicAuth, CloneTarget};
use crate::types::CommitHash;

/// Submodule nesting followed during clone.
pub const DEFAULT_SUBMODULE_DEPTH: usize = 10;

/// Errors from the source transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("transfer cancelled")]
    Cancelled,

    #[error("git error: {0}")]
    Git(String),
}

/// Blocking source-control operations. Implementations are driven from
/// `spawn_blocking`, so they must be shareable across threads.
pub trait SourceTransport: Send + Sync + 'static {
    /// Clone `target` into `dest` with history truncated to one commit,
    /// following submodules. Must return promptly once `cancel` fires.
    fn clone_shallow(
        &self,
        target: &CloneTarget,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError>;

    /// Force the worktree at `dest` to `commit`, discarding local changes to
    /// tracked files and keeping untracked ones.
    fn checkout(&self, dest: &Path, commit: &CommitHash) -> Result<(), TransportError>;
}

/// `SourceTransport` over libgit2.
#[derive(Debug, Clone)]
pub struct GitTransport {
    submodule_depth: usize,
}

impl Default for GitTransport {
    fn default() -> Self {
        Self {
            submodule_depth: DEFAULT_SUBMODULE_DEPTH,
        }
    }
}

impl SourceTransport for GitTransport {
    fn clone_shallow(
        &self,
        target: &CloneTarget,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        let mut fetch = fetch_options(target.auth.as_ref(), cancel);
        fetch.depth(1);

        let repo = RepoBuilder::new()
            .fetch_options(fetch)
            .clone(&target.url, dest)
            .map_err(|e| map_git_error(e, cancel))?;

        update_submodules(&repo, target.auth.as_ref(), cancel, self.submodule_depth)
            .map_err(|e| map_git_error(e, cancel))
    }

    fn checkout(&self, dest: &Path, commit: &CommitHash) -> Result<(), TransportError> {
        let repo = Repository::open(dest).map_err(|e| TransportError::Git(e.to_string()))?;

        let target = repo
            .revparse_single(commit.as_str())
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| TransportError::NotFound(format!("{}: {}", commit, e.message())))?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        repo.checkout_tree(target.as_object(), Some(&mut checkout))
            .map_err(|e| TransportError::Git(e.to_string()))?;
        repo.set_head_detached(target.id())
            .map_err(|e| TransportError::Git(e.to_string()))?;

        tracing::debug!(commit = %target.id(), path = %dest.display(), "checked out");
        Ok(())
    }
}

fn fetch_options<'a>(auth: Option<&'a BasicAuth>, cancel: &'a CancellationToken) -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();

    if let Some(auth) = auth {
        // libgit2 re-asks for credentials after a rejection; answer once only.
        let attempts = Cell::new(0u8);
        callbacks.credentials(move |_url, _username, _allowed| {
            attempts.set(attempts.get() + 1);
            if attempts.get() > 1 {
                return Err(git2::Error::new(
                    ErrorCode::Auth,
                    ErrorClass::Http,
                    "credentials rejected by remote",
                ));
            }
            Cred::userpass_plaintext(&auth.username, &auth.password)
        });
    }

    callbacks.transfer_progress(move |_| !cancel.is_cancelled());

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

fn update_submodules(
    repo: &Repository,
    auth: Option<&BasicAuth>,
    cancel: &CancellationToken,
    depth_left: usize,
) -> Result<(), git2::Error> {
    if depth_left == 0 {
        return Ok(());
    }

    for mut submodule in repo.submodules()? {
        let mut options = SubmoduleUpdateOptions::new();
        options.fetch(fetch_options(auth, cancel));
        submodule.update(true, Some(&mut options))?;

        let nested = submodule.open()?;
        update_submodules(&nested, auth, cancel, depth_left - 1)?;
    }

    Ok(())
}

fn map_git_error(e: git2::Error, cancel: &CancellationToken) -> TransportError {
    if cancel.is_cancelled() {
        return TransportError::Cancelled;
    }
    match (e.code(), e.class()) {
        (ErrorCode::Auth, _) => TransportError::Auth(e.message().to_string()),
        (ErrorCode::NotFound, _) => TransportError::NotFound(e.message().to_string()),
        (_, ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssl) => {
            TransportError::Network(e.message().to_string())
        }
        _ => TransportError::Git(e.to_string()),
    }
}
