// ABOUTME: Runs one deployment end to end: fetch, build, retire, launch.
// ABOUTME: Enforces the overall deadline and removes the built image when a later stage fails.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::runtime::{DEFAULT_HOST_IP, Engine};
use crate::source::{SourceTransport, WorkspaceFetcher};

use super::Deployment;
use super::builder::ImageBuilder;
use super::error::DeployError;
use super::handle::DeploymentHandle;
use super::lifecycle::{DEFAULT_STOP_TIMEOUT, LifecycleManager};
use super::lock::DeployLocks;
use super::request::DeploymentRequest;

/// Bound on everything up to and including container start.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30 * 60);
/// Bound on the clone alone.
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(60);

/// Tunables for a [`DeploymentOrchestrator`].
#[derive(Debug, Clone)]
pub struct DeploySettings {
    /// Directory workspaces are checked out under.
    pub storage_root: PathBuf,
    pub deadline: Duration,
    pub clone_timeout: Duration,
    /// Grace period when stopping previous containers.
    pub stop_timeout: Duration,
    /// Host interface published ports bind to.
    pub host_ip: String,
    /// Queue runs for the same project and commit behind each other.
    pub serialize_deploys: bool,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("repos"),
            deadline: DEFAULT_DEADLINE,
            clone_timeout: DEFAULT_CLONE_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            host_ip: DEFAULT_HOST_IP.to_string(),
            serialize_deploys: false,
        }
    }
}

/// Entry point for deployments.
///
/// The engine client and source transport are injected and shared by every
/// run. Runs are independent of each other unless `serialize_deploys` is set.
pub struct DeploymentOrchestrator<R, T> {
    runtime: Arc<R>,
    fetcher: WorkspaceFetcher<T>,
    builder: ImageBuilder<R>,
    lifecycle: LifecycleManager<R>,
    deadline: Duration,
    locks: Option<DeployLocks>,
}

impl<R: Engine, T: SourceTransport> DeploymentOrchestrator<R, T> {
    pub fn new(runtime: Arc<R>, transport: Arc<T>, settings: &DeploySettings) -> Self {
        Self {
            fetcher: WorkspaceFetcher::new(
                transport,
                settings.storage_root.clone(),
                settings.clone_timeout,
            ),
            builder: ImageBuilder::new(Arc::clone(&runtime)),
            lifecycle: LifecycleManager::new(Arc::clone(&runtime))
                .stop_timeout(settings.stop_timeout)
                .host_ip(settings.host_ip.clone()),
            runtime,
            deadline: settings.deadline,
            locks: settings.serialize_deploys.then(DeployLocks::new),
        }
    }

    /// Deploy `request`, returning as soon as the new container has started.
    ///
    /// Exit of the container is observed in the background; await it through
    /// the returned handle. When the deadline expires the stage in flight is
    /// abandoned and no rollback happens.
    ///
    /// Work that outlives the abandoned future, such as a clone on a blocking
    /// thread, is told to stop once this returns or is dropped.
    pub async fn run(&self, request: DeploymentRequest) -> Result<DeploymentHandle, DeployError> {
        let project = request.project.to_string();
        let commit = request.commit.to_string();
        let cancel = CancellationToken::new();
        let _stop_detached_work = cancel.clone().drop_guard();

        info!(project = %project, commit = %commit, ports = request.ports.len(), "deployment started");
        match tokio::time::timeout(self.deadline, self.execute(request, &cancel)).await {
            Ok(Ok(handle)) => {
                info!(
                    project = %project,
                    commit = %commit,
                    container = %handle.container().short(),
                    "deployment launched"
                );
                Ok(handle)
            }
            Ok(Err(err)) => {
                warn!(project = %project, commit = %commit, stage = %err.stage(), error = %err, "deployment failed");
                Err(err)
            }
            Err(_) => {
                warn!(project = %project, commit = %commit, deadline = ?self.deadline, "deployment timed out");
                Err(DeployError::Timeout {
                    project,
                    commit,
                    deadline: self.deadline,
                })
            }
        }
    }

    async fn execute(
        &self,
        request: DeploymentRequest,
        cancel: &CancellationToken,
    ) -> Result<DeploymentHandle, DeployError> {
        let DeploymentRequest {
            project,
            commit,
            ports,
            credentials,
            mut log_sink,
        } = request;

        let _lock = match &self.locks {
            Some(locks) => Some(locks.acquire(&project, &commit).await),
            None => None,
        };

        let fetched = Deployment::new(project, commit, ports)
            .fetch(&self.fetcher, credentials.as_ref(), cancel)
            .await?;

        let built = match fetched.build(&self.builder, &mut log_sink).await {
            Ok(built) => built,
            Err((failed, err)) => {
                failed.rollback(self.runtime.as_ref()).await;
                return Err(err);
            }
        };

        let retired = match built.retire(&self.lifecycle).await {
            Ok(retired) => retired,
            Err((failed, err)) => {
                failed.rollback(self.runtime.as_ref()).await;
                return Err(err);
            }
        };

        let launched = match retired.launch(&self.lifecycle).await {
            Ok(launched) => launched,
            Err((failed, err)) => {
                failed.rollback(self.runtime.as_ref()).await;
                return Err(err);
            }
        };

        Ok(launched.detach(&self.lifecycle))
    }
}
