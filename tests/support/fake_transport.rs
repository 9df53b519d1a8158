// ABOUTME: Filesystem-only source transport for fetcher and orchestrator tests.
// ABOUTME: Writes a fixed tree on clone and knows a configurable set of commits.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use hookd::source::{CloneTarget, SourceTransport, TransportError};
use hookd::types::CommitHash;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

pub const DOCKERFILE: &str = "FROM scratch\nCOPY . /app\n";

#[derive(Default)]
struct State {
    known_commits: Option<HashSet<String>>,
    clone_failure: Option<TransportError>,
    clone_delay: Option<Duration>,
    targets: Vec<CloneTarget>,
    checkouts: Vec<String>,
    cancelled_clones: usize,
}

/// Clones by writing a `Dockerfile` and `app.txt` into the destination.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<State>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only these commits can be checked out; every commit is known otherwise.
    pub fn with_commits(commits: &[&str]) -> Self {
        let transport = Self::default();
        transport.state.lock().known_commits =
            Some(commits.iter().map(|c| c.to_string()).collect());
        transport
    }

    /// Fail the next clone with `error` after writing part of the tree.
    pub fn fail_next_clone(&self, error: TransportError) {
        self.state.lock().clone_failure = Some(error);
    }

    /// Make every clone take `delay` unless cancelled first.
    pub fn delay_clone(&self, delay: Duration) {
        self.state.lock().clone_delay = Some(delay);
    }

    pub fn targets(&self) -> Vec<CloneTarget> {
        self.state.lock().targets.clone()
    }

    pub fn checkouts(&self) -> Vec<String> {
        self.state.lock().checkouts.clone()
    }

    /// Clones that stopped because their token was cancelled.
    pub fn cancelled_clones(&self) -> usize {
        self.state.lock().cancelled_clones
    }
}

impl SourceTransport for FakeTransport {
    fn clone_shallow(
        &self,
        target: &CloneTarget,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        let (delay, failure) = {
            let mut guard = self.state.lock();
            guard.targets.push(target.clone());
            (guard.clone_delay, guard.clone_failure.take())
        };

        std::fs::create_dir_all(dest).map_err(|e| TransportError::Git(e.to_string()))?;

        if let Some(delay) = delay {
            let started = Instant::now();
            while started.elapsed() < delay {
                if cancel.is_cancelled() {
                    self.state.lock().cancelled_clones += 1;
                    return Err(TransportError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        }

        std::fs::write(dest.join("Dockerfile"), DOCKERFILE)
            .map_err(|e| TransportError::Git(e.to_string()))?;

        if let Some(error) = failure {
            return Err(error);
        }

        std::fs::write(dest.join("app.txt"), target.url.as_bytes())
            .map_err(|e| TransportError::Git(e.to_string()))
    }

    fn checkout(&self, dest: &Path, commit: &CommitHash) -> Result<(), TransportError> {
        let mut guard = self.state.lock();
        if let Some(known) = &guard.known_commits
            && !known.contains(commit.as_str())
        {
            return Err(TransportError::NotFound(format!(
                "revspec '{commit}' not found"
            )));
        }
        guard.checkouts.push(commit.to_string());
        std::fs::write(dest.join("COMMIT"), commit.as_str())
            .map_err(|e| TransportError::Git(e.to_string()))
    }
}
