// ABOUTME: Bollard-based container engine implementation.
// ABOUTME: Talks to Docker or Podman over the Docker-compatible socket API.

use crate::runtime::traits::{
    BuildEvent, BuildOptions, BuildStream, ContainerConfig, ContainerError, ContainerFilters,
    ContainerOps, ContainerState, ContainerSummary, ExitStatus, ImageError, ImageOps, RuntimeInfo,
    RuntimeInfoError, RuntimeMetadata,
};
use crate::runtime::types::RuntimeType;
use crate::types::{ContainerId, ImageId, ImageTag};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{BuildInfo, ContainerCreateBody, HostConfig, PortBinding};
use bollard::query_parameters::{
    BuildImageOptions, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    RemoveImageOptions, StartContainerOptions, StopContainerOptions, WaitContainerOptions,
};
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{Either, Full};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// Seconds bollard waits on a single API call. Builds can run far longer
/// than a normal request, so this stays generous; the deployment deadline
/// bounds the total.
const CLIENT_TIMEOUT_SECS: u64 = 3600;

/// Build events buffered between the engine task and the reader.
const BUILD_EVENT_BUFFER: usize = 64;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_image_remove_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(image_name.to_string())
        }
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 409 =>
        {
            ImageError::InUse(image_name.to_string())
        }
        _ => ImageError::Runtime(format!("failed to remove {}: {}", image_name, e)),
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::AlreadyExists(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::AlreadyRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_stop_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::NotRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_remove_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_wait_error(e: bollard::errors::Error) -> Result<ExitStatus, ContainerError> {
    match e {
        // bollard reports a non-zero exit as an error; it is still a normal exit.
        bollard::errors::Error::DockerContainerWaitError { error, code } => Ok(ExitStatus {
            code,
            error: if error.is_empty() { None } else { Some(error) },
        }),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if status_code == 404 => Err(ContainerError::NotFound(message)),
        other => Err(ContainerError::WaitFailed(other.to_string())),
    }
}

fn build_image_options(options: &BuildOptions) -> BuildImageOptions {
    BuildImageOptions {
        dockerfile: "Dockerfile".to_string(),
        t: Some(options.tag.to_string()),
        q: options.quiet,
        rm: options.remove_intermediate,
        forcerm: options.force_remove_intermediate,
        pull: options.pull.then(|| "true".to_string()),
        ..Default::default()
    }
}

/// Split one chunk of engine build output into the events it carries.
fn build_events(
    result: Result<BuildInfo, bollard::errors::Error>,
) -> Vec<Result<BuildEvent, ImageError>> {
    let info = match result {
        Ok(info) => info,
        Err(e) => return vec![Err(ImageError::BuildFailed(e.to_string()))],
    };

    let mut events = Vec::new();
    if let Some(text) = info.stream {
        events.push(Ok(BuildEvent::Output(text)));
    }
    if let Some(status) = info.status {
        events.push(Ok(BuildEvent::Output(format!("{}\n", status))));
    }
    if let Some(id) = info.aux.and_then(|aux| aux.id) {
        events.push(Ok(BuildEvent::Built(ImageId::new(id))));
    }
    if let Some(detail) = info.error_detail {
        let message = detail
            .message
            .unwrap_or_else(|| "unknown build error".to_string());
        events.push(Err(ImageError::BuildFailed(message)));
    }
    events
}

fn host_config(config: &ContainerConfig) -> (HostConfig, Vec<String>) {
    let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
    let mut exposed_ports: Vec<String> = Vec::new();
    for port in &config.ports {
        let port_key = port.port_key();
        exposed_ports.push(port_key.clone());
        port_bindings.insert(
            port_key,
            Some(vec![PortBinding {
                host_ip: Some(port.host_ip.clone()),
                host_port: Some(port.host_port.to_string()),
            }]),
        );
    }

    let host_config = HostConfig {
        auto_remove: Some(config.auto_remove),
        port_bindings: if port_bindings.is_empty() {
            None
        } else {
            Some(port_bindings)
        },
        ..Default::default()
    };

    (host_config, exposed_ports)
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container engine implementation using bollard.
///
/// Works against Docker and Podman through the Docker-compatible API.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to the engine described by `info`.
    ///
    /// Use with [`detect_local`](super::detect_local) or
    /// [`resolve`](super::resolve) to find the socket.
    pub fn connect(info: &super::types::RuntimeInfo) -> Result<Self, RuntimeInfoError> {
        let client = Docker::connect_with_unix(
            &info.socket_path,
            CLIENT_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(Self::new(client, info.runtime_type))
    }
}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        Ok(RuntimeMetadata {
            name: self.runtime_type.display_name().to_string(),
            version: info.server_version.unwrap_or_default(),
            api_version: bollard::API_DEFAULT_VERSION.to_string(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn build_image(
        &self,
        context: Vec<u8>,
        options: &BuildOptions,
    ) -> Result<BuildStream, ImageError> {
        // The bollard stream borrows its client, so it is driven on a task
        // that owns a clone and forwards events over a channel.
        let client = self.client.clone();
        let build_options = build_image_options(options);
        let (tx, rx) = mpsc::channel(BUILD_EVENT_BUFFER);

        tokio::spawn(async move {
            let body = Either::Left(Full::new(Bytes::from(context)));
            let mut stream = client.build_image(build_options, None, Some(body));
            // Dropping the engine stream closes the connection, which ends the
            // build once nobody reads its output.
            loop {
                let result = tokio::select! {
                    _ = tx.closed() => return,
                    next = stream.next() => match next {
                        Some(result) => result,
                        None => return,
                    },
                };
                for event in build_events(result) {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })))
    }

    async fn remove_image(
        &self,
        tag: &ImageTag,
        force: bool,
        prune_children: bool,
    ) -> Result<(), ImageError> {
        let image_name = tag.to_string();

        let opts = RemoveImageOptions {
            force,
            noprune: !prune_children,
            ..Default::default()
        };

        self.client
            .remove_image(&image_name, Some(opts), None)
            .await
            .map_err(|e| map_image_remove_error(e, &image_name))?;

        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in &filters.labels {
            filter_map
                .entry("label".to_string())
                .or_default()
                .push(format!("{}={}", key, value));
        }

        let opts = ListContainersOptions {
            all: filters.all,
            filters: if filter_map.is_empty() {
                None
            } else {
                Some(filter_map)
            },
            ..Default::default()
        };

        // Podman reports "stopping" as a container state during shutdown, but bollard
        // doesn't recognize it and fails deserialization. Retry after a short delay
        // since "stopping" is a transient state.
        let mut last_error = None;
        for attempt in 0..3 {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .map(|c| {
                            let name = c
                                .names
                                .unwrap_or_default()
                                .first()
                                .map(|n| n.trim_start_matches('/').to_string())
                                .unwrap_or_default();
                            let state = c
                                .state
                                .map(|s| ContainerState::from_engine(&format!("{:?}", s)))
                                .unwrap_or(ContainerState::Unknown);

                            ContainerSummary {
                                id: ContainerId::new(c.id.unwrap_or_default()),
                                name,
                                image: c.image.unwrap_or_default(),
                                state,
                                status: c.status.unwrap_or_default(),
                                labels: c.labels.unwrap_or_default(),
                            }
                        })
                        .collect());
                }
                Err(e) => {
                    let err_str = e.to_string();
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(timeout.as_secs() as i32),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_stop_error)
    }

    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let (host_config, exposed_ports) = host_config(config);

        let body = ContainerCreateBody {
            image: Some(config.image.to_string()),
            labels: if config.labels.is_empty() {
                None
            } else {
                Some(config.labels.clone())
            },
            host_config: Some(host_config),
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            ..Default::default()
        };

        let response = self
            .client
            .create_container(None::<CreateContainerOptions>, body)
            .await
            .map_err(map_container_create_error)?;

        for warning in &response.warnings {
            tracing::warn!(container = %response.id, "{}", warning);
        }

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_container_start_error)
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            v: true,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_remove_error)
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<ExitStatus, ContainerError> {
        let mut stream = self
            .client
            .wait_container(id.as_str(), None::<WaitContainerOptions>);

        match stream.next().await {
            Some(Ok(response)) => Ok(ExitStatus {
                code: response.status_code,
                error: response.error.and_then(|e| e.message),
            }),
            Some(Err(e)) => map_container_wait_error(e),
            None => Err(ContainerError::WaitFailed(format!(
                "engine closed wait stream for {}",
                id.short()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::traits::PortMapping;
    use crate::types::{CommitHash, PortBinding as Binding, ProjectRef};

    fn tag() -> ImageTag {
        let project = ProjectRef::new("github.com/acme/api").unwrap();
        let commit = CommitHash::new("abc1234").unwrap();
        ImageTag::new(&project, &commit)
    }

    #[test]
    fn build_options_carry_tag_and_cleanup_flags() {
        let opts = build_image_options(&BuildOptions::for_deploy(tag()));
        assert_eq!(opts.t.as_deref(), Some("github.com/acme/api:abc1234"));
        assert_eq!(opts.dockerfile, "Dockerfile");
        assert!(opts.rm);
        assert!(opts.forcerm);
        assert_eq!(opts.pull.as_deref(), Some("true"));
    }

    #[test]
    fn host_config_publishes_every_port() {
        let config = ContainerConfig {
            image: tag(),
            labels: HashMap::new(),
            ports: vec![
                PortMapping::tcp(Binding::new(8080, 80), "0.0.0.0"),
                PortMapping::tcp(Binding::new(9443, 443), "127.0.0.1"),
            ],
            auto_remove: true,
        };

        let (host, exposed) = host_config(&config);
        assert_eq!(exposed.len(), 2);
        assert_eq!(host.auto_remove, Some(true));

        let bindings = host.port_bindings.unwrap();
        let http = bindings["80/tcp"].as_ref().unwrap();
        assert_eq!(http[0].host_port.as_deref(), Some("8080"));
        assert_eq!(http[0].host_ip.as_deref(), Some("0.0.0.0"));
        let https = bindings["443/tcp"].as_ref().unwrap();
        assert_eq!(https[0].host_ip.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn no_ports_means_no_bindings() {
        let config = ContainerConfig {
            image: tag(),
            labels: HashMap::new(),
            ports: Vec::new(),
            auto_remove: false,
        };
        let (host, exposed) = host_config(&config);
        assert!(exposed.is_empty());
        assert!(host.port_bindings.is_none());
    }

    #[test]
    fn build_output_and_image_id_become_events() {
        let info = BuildInfo {
            stream: Some("Step 1/2 : FROM scratch\n".to_string()),
            aux: Some(bollard::models::ImageId {
                id: Some("sha256:feed".to_string()),
            }),
            ..Default::default()
        };

        let events = build_events(Ok(info));
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            Ok(BuildEvent::Output(text)) if text == "Step 1/2 : FROM scratch\n"
        ));
        assert!(matches!(
            &events[1],
            Ok(BuildEvent::Built(id)) if id.as_str() == "sha256:feed"
        ));
    }

    #[test]
    fn build_error_detail_fails_the_build() {
        let info = BuildInfo {
            error_detail: Some(bollard::models::ErrorDetail {
                code: Some(1),
                message: Some("COPY failed: no such file".to_string()),
            }),
            ..Default::default()
        };

        let events = build_events(Ok(info));
        assert!(matches!(
            events.as_slice(),
            [Err(ImageError::BuildFailed(msg))] if msg.contains("COPY failed")
        ));
    }

    #[test]
    fn removing_a_missing_container_is_not_found() {
        let err = map_container_remove_error(bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container: 4f2a".to_string(),
        });
        assert!(matches!(err, ContainerError::NotFound(msg) if msg.contains("4f2a")));
    }

    #[test]
    fn non_zero_wait_is_an_exit_not_a_failure() {
        let status = map_container_wait_error(bollard::errors::Error::DockerContainerWaitError {
            error: String::new(),
            code: 3,
        })
        .unwrap();
        assert_eq!(status.code, 3);
        assert!(!status.success());
    }
}
