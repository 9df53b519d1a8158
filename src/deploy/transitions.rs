// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::runtime::{ContainerOps, ImageError, ImageOps};
use crate::source::{Credentials, SourceTransport, WorkspaceFetcher};

use super::Deployment;
use super::builder::ImageBuilder;
use super::error::DeployError;
use super::handle::DeploymentHandle;
use super::lifecycle::LifecycleManager;
use super::state::{Built, Fetched, HoldsImage, Initialized, Launched, Retired};

/// Result type for transitions that may need rollback on failure.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

impl<S> Deployment<S> {
    fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            project: self.project,
            commit: self.commit,
            ports: self.ports,
            state,
        }
    }

    fn project_name(&self) -> String {
        self.project.to_string()
    }

    fn commit_name(&self) -> String {
        self.commit.to_string()
    }
}

// =============================================================================
// Initialized -> Fetched
// =============================================================================

impl Deployment<Initialized> {
    /// Check out the requested commit into a fresh workspace.
    ///
    /// Nothing exists yet that would need cleaning up, so failure simply
    /// ends the deployment.
    pub async fn fetch<T: SourceTransport>(
        self,
        fetcher: &WorkspaceFetcher<T>,
        credentials: Option<&Credentials>,
        cancel: &CancellationToken,
    ) -> Result<Deployment<Fetched>, DeployError> {
        match fetcher
            .fetch(&self.project, &self.commit, credentials, cancel)
            .await
        {
            Ok(workspace) => {
                info!(project = %self.project, commit = %self.commit, "source fetched");
                Ok(self.transition(Fetched { workspace }))
            }
            Err(source) => Err(DeployError::Fetch {
                project: self.project_name(),
                commit: self.commit_name(),
                source,
            }),
        }
    }
}

// =============================================================================
// Fetched -> Built
// =============================================================================

impl Deployment<Fetched> {
    /// Build and tag the image, streaming build output into `sink`.
    ///
    /// On failure the workspace stays on disk and the deployment comes back
    /// so the caller can remove a partially tagged image.
    pub async fn build<R, W>(
        self,
        builder: &ImageBuilder<R>,
        sink: &mut W,
    ) -> TransitionResult<Built, Fetched>
    where
        R: ImageOps,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let tag = self.image_tag();
        match builder
            .build(&self.state.workspace, &tag, sink)
            .await
        {
            Ok(image_id) => {
                info!(tag = %tag, "image built");
                let workspace = self.state.workspace.clone();
                Ok(self.transition(Built {
                    workspace,
                    image_id,
                }))
            }
            Err(source) => {
                warn!(
                    workspace = %self.state.workspace.display(),
                    "build failed, workspace left on disk"
                );
                let err = DeployError::Build {
                    project: self.project_name(),
                    commit: self.commit_name(),
                    source,
                };
                Err((self, err))
            }
        }
    }
}

// =============================================================================
// Built -> Retired
// =============================================================================

impl Deployment<Built> {
    /// Stop every running container of the project.
    pub async fn retire<R: ContainerOps + 'static>(
        self,
        lifecycle: &LifecycleManager<R>,
    ) -> TransitionResult<Retired, Built> {
        match lifecycle.retire_existing(&self.project).await {
            Ok(retired) => {
                let Built {
                    workspace,
                    image_id,
                } = self.state.clone();
                Ok(self.transition(Retired {
                    workspace,
                    image_id,
                    retired,
                }))
            }
            Err(source) => {
                let err = DeployError::Retire {
                    project: self.project_name(),
                    commit: self.commit_name(),
                    source,
                };
                Err((self, err))
            }
        }
    }
}

// =============================================================================
// Retired -> Launched
// =============================================================================

impl Deployment<Retired> {
    /// Create and start the new container.
    pub async fn launch<R: ContainerOps + 'static>(
        self,
        lifecycle: &LifecycleManager<R>,
    ) -> TransitionResult<Launched, Retired> {
        let tag = self.image_tag();
        match lifecycle.launch(&self.project, &tag, &self.ports).await {
            Ok(container) => {
                let Retired {
                    workspace,
                    image_id,
                    retired,
                } = self.state.clone();
                Ok(self.transition(Launched {
                    workspace,
                    image_id,
                    retired,
                    container,
                }))
            }
            Err(source) => {
                let err = DeployError::Launch {
                    project: self.project_name(),
                    commit: self.commit_name(),
                    source,
                };
                Err((self, err))
            }
        }
    }
}

// =============================================================================
// Launched -> handle
// =============================================================================

impl Deployment<Launched> {
    /// Hand exit observation to a detached task and finish the deployment.
    pub fn detach<R: ContainerOps + 'static>(
        self,
        lifecycle: &LifecycleManager<R>,
    ) -> DeploymentHandle {
        let image = self.image_tag();
        let exit = lifecycle.await_exit(self.state.container.clone());
        DeploymentHandle {
            project: self.project,
            commit: self.commit,
            image,
            image_id: self.state.image_id,
            container: self.state.container,
            workspace: self.state.workspace,
            retired: self.state.retired,
            exit,
        }
    }
}

// =============================================================================
// Rollback
// =============================================================================

impl<S: HoldsImage> Deployment<S> {
    /// Remove the image this deployment built.
    ///
    /// Best-effort: a failure is logged and otherwise ignored, so it never
    /// replaces the error that triggered the rollback.
    pub async fn rollback<R: ImageOps>(self, runtime: &R) {
        let tag = self.image_tag();
        match runtime.remove_image(&tag, true, true).await {
            Ok(()) => info!(tag = %tag, "rolled back built image"),
            Err(ImageError::NotFound(_)) => debug!(tag = %tag, "no image to roll back"),
            Err(e) => warn!(tag = %tag, error = %e, "failed to remove image during rollback"),
        }
    }
}
