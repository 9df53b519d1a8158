// ABOUTME: In-memory container engine for orchestrator tests.
// ABOUTME: Records every call and lets tests inject failures, delays, and container exits.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use hookd::runtime::{
    BuildEvent, BuildOptions, BuildStream, ContainerConfig, ContainerError, ContainerFilters,
    ContainerOps, ContainerState, ContainerSummary, ExitStatus, ImageError, ImageOps,
};
use hookd::types::{ContainerId, ImageId, ImageTag};
use parking_lot::Mutex;
use tokio::sync::watch;

/// Exit code reported for containers stopped through the engine.
pub const STOPPED_EXIT_CODE: i64 = 143;

/// One engine call, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Build(String),
    RemoveImage(String),
    List,
    Stop(String),
    Create(String),
    Start(String),
    RemoveContainer(String),
}

struct FakeContainer {
    summary: ContainerSummary,
    config: Option<ContainerConfig>,
    auto_remove: bool,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    images: HashSet<String>,
    containers: Vec<FakeContainer>,
    exits: HashMap<String, watch::Sender<Option<ExitStatus>>>,
    contexts: Vec<Vec<u8>>,
    next_id: u64,
    fail_build: bool,
    fail_stop: bool,
    fail_create: bool,
    fail_start: bool,
    build_delay: Option<Duration>,
}

#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_build(&self) {
        self.state.lock().fail_build = true;
    }

    pub fn fail_stop(&self) {
        self.state.lock().fail_stop = true;
    }

    pub fn fail_create(&self) {
        self.state.lock().fail_create = true;
    }

    pub fn fail_start(&self) {
        self.state.lock().fail_start = true;
    }

    pub fn delay_build(&self, delay: Duration) {
        self.state.lock().build_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn images(&self) -> Vec<String> {
        let mut images: Vec<_> = self.state.lock().images.iter().cloned().collect();
        images.sort();
        images
    }

    pub fn has_image(&self, tag: &str) -> bool {
        self.state.lock().images.contains(tag)
    }

    /// Build contexts received, oldest first.
    pub fn contexts(&self) -> Vec<Vec<u8>> {
        self.state.lock().contexts.clone()
    }

    /// Containers currently running.
    pub fn running(&self) -> Vec<ContainerSummary> {
        self.state
            .lock()
            .containers
            .iter()
            .filter(|c| c.summary.state.is_live())
            .map(|c| c.summary.clone())
            .collect()
    }

    /// Every container the engine knows about, in any state.
    pub fn containers(&self) -> Vec<ContainerSummary> {
        self.state
            .lock()
            .containers
            .iter()
            .map(|c| c.summary.clone())
            .collect()
    }

    /// Config a container was created with.
    pub fn config_of(&self, id: &ContainerId) -> Option<ContainerConfig> {
        self.state
            .lock()
            .containers
            .iter()
            .find(|c| &c.summary.id == id)
            .and_then(|c| c.config.clone())
    }

    /// Add a container the engine already knows about, e.g. one started by
    /// hand outside any deployment.
    pub fn seed_container(
        &self,
        image: &str,
        labels: &[(&str, &str)],
        state: ContainerState,
    ) -> ContainerId {
        let mut guard = self.state.lock();
        let id = next_container_id(&mut guard);
        let summary = ContainerSummary {
            id: id.clone(),
            name: format!("seeded-{}", guard.next_id),
            image: image.to_string(),
            state,
            status: state.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        guard.containers.push(FakeContainer {
            summary,
            config: None,
            auto_remove: false,
        });
        guard.exits.insert(id.to_string(), watch::channel(None).0);
        id
    }

    /// Make a running container exit on its own.
    pub fn exit(&self, id: &ContainerId, code: i64) {
        let mut guard = self.state.lock();
        finish(&mut guard, id, code);
    }
}

fn next_container_id(state: &mut State) -> ContainerId {
    state.next_id += 1;
    ContainerId::new(format!("{:064x}", state.next_id))
}

fn finish(state: &mut State, id: &ContainerId, code: i64) {
    let Some(pos) = state.containers.iter().position(|c| &c.summary.id == id) else {
        return;
    };
    if state.containers[pos].auto_remove {
        state.containers.remove(pos);
    } else {
        state.containers[pos].summary.state = ContainerState::Exited;
    }
    if let Some(tx) = state.exits.get(id.as_str()) {
        tx.send_replace(Some(ExitStatus { code, error: None }));
    }
}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn build_image(
        &self,
        context: Vec<u8>,
        options: &BuildOptions,
    ) -> Result<BuildStream, ImageError> {
        let tag = options.tag.to_string();
        let (delay, fail) = {
            let mut guard = self.state.lock();
            guard.calls.push(Call::Build(tag.clone()));
            guard.contexts.push(context);
            (guard.build_delay, guard.fail_build)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        // A failing build still leaves the tag behind, like a build whose last
        // step failed after an earlier tag was written.
        self.state.lock().images.insert(tag.clone());

        let mut events = vec![
            Ok(BuildEvent::Output("Step 1/2 : FROM scratch\n".to_string())),
            Ok(BuildEvent::Output("Step 2/2 : COPY . /app\n".to_string())),
        ];
        if fail {
            events.push(Err(ImageError::BuildFailed(
                "COPY failed: no source files".to_string(),
            )));
        } else {
            events.push(Ok(BuildEvent::Built(ImageId::new(format!("sha256:{tag}")))));
        }
        Ok(Box::pin(futures::stream::iter(events)))
    }

    async fn remove_image(
        &self,
        tag: &ImageTag,
        _force: bool,
        _prune_children: bool,
    ) -> Result<(), ImageError> {
        let mut guard = self.state.lock();
        let tag = tag.to_string();
        guard.calls.push(Call::RemoveImage(tag.clone()));
        if guard.images.remove(&tag) {
            Ok(())
        } else {
            Err(ImageError::NotFound(tag))
        }
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut guard = self.state.lock();
        guard.calls.push(Call::List);
        Ok(guard
            .containers
            .iter()
            .filter(|c| filters.all || c.summary.state.is_live())
            .filter(|c| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.summary.labels.get(k) == Some(v))
            })
            .map(|c| c.summary.clone())
            .collect())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut guard = self.state.lock();
        guard.calls.push(Call::Stop(id.to_string()));
        if guard.fail_stop {
            return Err(ContainerError::Runtime("stop refused".to_string()));
        }
        let state = guard
            .containers
            .iter()
            .find(|c| &c.summary.id == id)
            .map(|c| c.summary.state)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if !state.is_live() {
            return Err(ContainerError::NotRunning(id.to_string()));
        }
        finish(&mut guard, id, STOPPED_EXIT_CODE);
        Ok(())
    }

    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let mut guard = self.state.lock();
        let image = config.image.to_string();
        guard.calls.push(Call::Create(image.clone()));
        if guard.fail_create {
            return Err(ContainerError::Runtime("create refused".to_string()));
        }
        if !guard.images.contains(&image) {
            return Err(ContainerError::ImageNotFound(image));
        }

        let id = next_container_id(&mut guard);
        let summary = ContainerSummary {
            id: id.clone(),
            name: format!("hookd-{}", guard.next_id),
            image,
            state: ContainerState::Created,
            status: "Created".to_string(),
            labels: config.labels.clone(),
        };
        guard.containers.push(FakeContainer {
            summary,
            config: Some(config.clone()),
            auto_remove: config.auto_remove,
        });
        guard.exits.insert(id.to_string(), watch::channel(None).0);
        Ok(id)
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut guard = self.state.lock();
        guard.calls.push(Call::Start(id.to_string()));
        if guard.fail_start {
            return Err(ContainerError::Runtime("start refused".to_string()));
        }
        let container = guard
            .containers
            .iter_mut()
            .find(|c| &c.summary.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if container.summary.state == ContainerState::Running {
            return Err(ContainerError::AlreadyRunning(id.to_string()));
        }
        container.summary.state = ContainerState::Running;
        container.summary.status = "Up".to_string();
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let mut guard = self.state.lock();
        guard.calls.push(Call::RemoveContainer(id.to_string()));
        let pos = guard
            .containers
            .iter()
            .position(|c| &c.summary.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if !force && guard.containers[pos].summary.state == ContainerState::Running {
            return Err(ContainerError::Runtime(format!("{id} is running")));
        }
        guard.containers.remove(pos);
        guard.exits.remove(id.as_str());
        Ok(())
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<ExitStatus, ContainerError> {
        let mut rx = self
            .state
            .lock()
            .exits
            .get(id.as_str())
            .map(|tx| tx.subscribe())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        let status = rx
            .wait_for(|status| status.is_some())
            .await
            .map_err(|e| ContainerError::WaitFailed(e.to_string()))?;
        status
            .clone()
            .ok_or_else(|| ContainerError::WaitFailed(id.to_string()))
    }
}
