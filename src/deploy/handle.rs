// ABOUTME: Handle returned by a successful deployment.
// ABOUTME: Identifies the running container and yields its exit result once it stops.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::oneshot;

use crate::types::{CommitHash, ContainerId, ImageId, ImageTag, ProjectRef};

use super::error::WaitError;
use super::lifecycle::RunResult;

/// A launched deployment.
///
/// Dropping the handle does not affect the container; its exit is then
/// only logged.
#[derive(Debug)]
pub struct DeploymentHandle {
    pub(crate) project: ProjectRef,
    pub(crate) commit: CommitHash,
    pub(crate) image: ImageTag,
    pub(crate) image_id: Option<ImageId>,
    pub(crate) container: ContainerId,
    pub(crate) workspace: PathBuf,
    pub(crate) retired: usize,
    pub(crate) exit: oneshot::Receiver<RunResult>,
}

/// Serializable description of a launched deployment.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSummary {
    pub project: String,
    pub commit: String,
    pub image: String,
    /// Engine ID of the image, when the build reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub container: String,
    pub workspace: PathBuf,
    pub retired: usize,
}

impl DeploymentHandle {
    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    pub fn commit(&self) -> &CommitHash {
        &self.commit
    }

    pub fn image(&self) -> &ImageTag {
        &self.image
    }

    /// Image ID reported by the engine at the end of the build.
    pub fn image_id(&self) -> Option<&ImageId> {
        self.image_id.as_ref()
    }

    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    /// Checked-out source the image was built from.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Number of previous containers stopped before launch.
    pub fn retired(&self) -> usize {
        self.retired
    }

    pub fn summary(&self) -> DeploymentSummary {
        DeploymentSummary {
            project: self.project.to_string(),
            commit: self.commit.to_string(),
            image: self.image.to_string(),
            image_id: self.image_id.as_ref().map(ToString::to_string),
            container: self.container.to_string(),
            workspace: self.workspace.clone(),
            retired: self.retired,
        }
    }

    /// Wait for the container to stop.
    pub async fn wait(self) -> RunResult {
        match self.exit.await {
            Ok(result) => result,
            Err(_) => Err(WaitError::Abandoned {
                container: self.container.to_string(),
            }),
        }
    }
}
