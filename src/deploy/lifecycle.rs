// ABOUTME: Container lifecycle for a project: retire old instances, launch, observe exit.
// ABOUTME: Exit observation runs on a detached task and reports once over a oneshot channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::runtime::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerOps, ContainerSummary,
    DEFAULT_HOST_IP, ExitStatus, PortMapping,
};
use crate::types::{ContainerId, ImageTag, PortBinding, ProjectRef};

use super::error::{LaunchError, RetireError, WaitError};

/// Label carrying the project reference of a launched container.
pub const LABEL_PROJECT: &str = "hookd.project";
/// Label carrying the deployed commit.
pub const LABEL_COMMIT: &str = "hookd.commit";

/// Grace period before a stopping container is killed.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a launched container, delivered once it stops.
pub type RunResult = Result<ExitStatus, WaitError>;

/// Manages the containers belonging to projects.
pub struct LifecycleManager<R> {
    runtime: Arc<R>,
    stop_timeout: Duration,
    host_ip: String,
}

impl<R> Clone for LifecycleManager<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            stop_timeout: self.stop_timeout,
            host_ip: self.host_ip.clone(),
        }
    }
}

impl<R: ContainerOps + 'static> LifecycleManager<R> {
    pub fn new(runtime: Arc<R>) -> Self {
        Self {
            runtime,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            host_ip: DEFAULT_HOST_IP.to_string(),
        }
    }

    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Host interface that published ports bind to.
    pub fn host_ip(mut self, host_ip: impl Into<String>) -> Self {
        self.host_ip = host_ip.into();
        self
    }

    /// Containers of `project`, running or not.
    pub async fn managed_containers(
        &self,
        project: &ProjectRef,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let containers = self
            .runtime
            .list_containers(&ContainerFilters::everything())
            .await?;
        Ok(containers
            .into_iter()
            .filter(|c| is_managed_by(c, project))
            .collect())
    }

    /// Stop every container of `project` and return how many were retired.
    ///
    /// Containers that already stopped or disappeared count as retired. Any
    /// other stop failure aborts, so a new instance never starts next to an
    /// old one that may still hold its ports.
    pub async fn retire_existing(&self, project: &ProjectRef) -> Result<usize, RetireError> {
        let matches = self
            .managed_containers(project)
            .await
            .map_err(RetireError::List)?;

        let mut retired = 0;
        for container in matches {
            debug!(container = %container.id.short(), image = %container.image, state = %container.state, "stopping");
            match self
                .runtime
                .stop_container(&container.id, self.stop_timeout)
                .await
            {
                Ok(()) => {}
                Err(ContainerError::NotRunning(_)) | Err(ContainerError::NotFound(_)) => {
                    debug!(container = %container.id.short(), "already stopped");
                }
                Err(source) => {
                    return Err(RetireError::Stop {
                        container: container.id.to_string(),
                        source,
                    });
                }
            }
            retired += 1;
        }

        if retired > 0 {
            info!(project = %project, retired, "retired previous containers");
        }
        Ok(retired)
    }

    /// Create and start a container from `image` publishing `ports`.
    pub async fn launch(
        &self,
        project: &ProjectRef,
        image: &ImageTag,
        ports: &[PortBinding],
    ) -> Result<ContainerId, LaunchError> {
        let config = self.container_config(project, image, ports);
        let id = self
            .runtime
            .create_container(&config)
            .await
            .map_err(LaunchError::Create)?;

        if let Err(source) = self.runtime.start_container(&id).await {
            // Best effort: the start error is what the caller needs to see.
            if let Err(e) = self.runtime.remove_container(&id, true).await {
                warn!(container = %id.short(), error = %e, "failed to remove container that did not start");
            }
            return Err(LaunchError::Start {
                container: id.to_string(),
                source,
            });
        }

        info!(container = %id.short(), image = %image, "container started");
        Ok(id)
    }

    /// Wait for `container` to stop on a detached task.
    ///
    /// The receiver yields exactly one result. The task outlives the caller
    /// and has no timeout of its own.
    pub fn await_exit(&self, container: ContainerId) -> oneshot::Receiver<RunResult> {
        let (tx, rx) = oneshot::channel();
        let runtime = Arc::clone(&self.runtime);

        tokio::spawn(async move {
            let result = runtime
                .wait_container(&container)
                .await
                .map_err(|source| WaitError::Engine {
                    container: container.to_string(),
                    source,
                });

            match &result {
                Ok(status) if status.success() => {
                    info!(container = %container.short(), "container exited cleanly")
                }
                Ok(status) => warn!(container = %container.short(), %status, "container exited"),
                Err(e) => warn!(container = %container.short(), error = %e, "wait failed"),
            }

            if tx.send(result).is_err() {
                debug!(container = %container.short(), "nobody listening for exit");
            }
        });

        rx
    }

    fn container_config(
        &self,
        project: &ProjectRef,
        image: &ImageTag,
        ports: &[PortBinding],
    ) -> ContainerConfig {
        let labels = HashMap::from([
            (LABEL_PROJECT.to_string(), project.to_string()),
            (LABEL_COMMIT.to_string(), image.commit().to_string()),
        ]);

        ContainerConfig {
            image: image.clone(),
            labels,
            ports: ports
                .iter()
                .map(|binding| PortMapping::tcp(*binding, &self.host_ip))
                .collect(),
            auto_remove: true,
        }
    }
}

/// A container belongs to a project when its image carries the project's
/// repository, or when it was labelled for the project at launch.
fn is_managed_by(container: &ContainerSummary, project: &ProjectRef) -> bool {
    container.image.starts_with(&project.image_prefix())
        || container
            .labels
            .get(LABEL_PROJECT)
            .is_some_and(|p| p == project.as_str())
}
