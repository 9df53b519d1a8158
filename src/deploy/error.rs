// ABOUTME: Error types for deployment stages.
// ABOUTME: One enum per stage plus DeployError, which tags failures with project and commit.

use std::path::PathBuf;
use std::time::Duration;

use crate::runtime::{ContainerError, ImageError};
use crate::source::FetchError;

/// Errors from building an image out of a workspace.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to archive build context {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image build failed: {0}")]
    Engine(#[source] ImageError),

    #[error("failed to copy build log: {0}")]
    LogCopy(#[source] std::io::Error),
}

/// Errors from stopping the previous containers of a project.
#[derive(Debug, thiserror::Error)]
pub enum RetireError {
    #[error("failed to list containers: {0}")]
    List(#[source] ContainerError),

    #[error("failed to stop container {container}: {source}")]
    Stop {
        container: String,
        #[source]
        source: ContainerError,
    },
}

/// Errors from creating or starting the new container.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to create container: {0}")]
    Create(#[source] ContainerError),

    #[error("failed to start container {container}: {source}")]
    Start {
        container: String,
        #[source]
        source: ContainerError,
    },
}

/// Errors observed while waiting for a launched container to exit.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("waiting for container {container} failed: {source}")]
    Engine {
        container: String,
        #[source]
        source: ContainerError,
    },

    #[error("exit of container {container} was never reported")]
    Abandoned { container: String },
}

/// The stage a deployment failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    Fetch,
    Build,
    Retire,
    Launch,
    /// The overall deadline expired; the stage in flight was abandoned.
    Deadline,
}

impl DeployStage {
    /// Whether a failure in this stage leaves a built image to remove.
    pub fn needs_rollback(&self) -> bool {
        matches!(
            self,
            DeployStage::Build | DeployStage::Retire | DeployStage::Launch
        )
    }
}

impl std::fmt::Display for DeployStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeployStage::Fetch => "fetch",
            DeployStage::Build => "build",
            DeployStage::Retire => "retire",
            DeployStage::Launch => "launch",
            DeployStage::Deadline => "deadline",
        };
        f.write_str(s)
    }
}

/// A failed deployment run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("fetching {project}@{commit} failed: {source}")]
    Fetch {
        project: String,
        commit: String,
        #[source]
        source: FetchError,
    },

    #[error("building {project}@{commit} failed: {source}")]
    Build {
        project: String,
        commit: String,
        #[source]
        source: BuildError,
    },

    #[error("retiring old containers of {project} failed: {source}")]
    Retire {
        project: String,
        commit: String,
        #[source]
        source: RetireError,
    },

    #[error("launching {project}@{commit} failed: {source}")]
    Launch {
        project: String,
        commit: String,
        #[source]
        source: LaunchError,
    },

    #[error("deployment of {project}@{commit} did not finish within {}s", deadline.as_secs())]
    Timeout {
        project: String,
        commit: String,
        deadline: Duration,
    },
}

impl DeployError {
    /// The stage this error came from.
    pub fn stage(&self) -> DeployStage {
        match self {
            DeployError::Fetch { .. } => DeployStage::Fetch,
            DeployError::Build { .. } => DeployStage::Build,
            DeployError::Retire { .. } => DeployStage::Retire,
            DeployError::Launch { .. } => DeployStage::Launch,
            DeployError::Timeout { .. } => DeployStage::Deadline,
        }
    }

    pub fn project(&self) -> &str {
        match self {
            DeployError::Fetch { project, .. }
            | DeployError::Build { project, .. }
            | DeployError::Retire { project, .. }
            | DeployError::Launch { project, .. }
            | DeployError::Timeout { project, .. } => project,
        }
    }

    pub fn commit(&self) -> &str {
        match self {
            DeployError::Fetch { commit, .. }
            | DeployError::Build { commit, .. }
            | DeployError::Retire { commit, .. }
            | DeployError::Launch { commit, .. }
            | DeployError::Timeout { commit, .. } => commit,
        }
    }

    /// Whether the failure was caused by the run's deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeployError::Timeout { .. })
    }
}
