// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerConfig, port mappings, build options/events, exit status, metadata.

use super::image::ImageError;
use crate::types::{ImageId, ImageTag, PortBinding};
use futures::Stream;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

/// Host interface port bindings are published on unless configured otherwise.
pub const DEFAULT_HOST_IP: &str = "0.0.0.0";

/// Configuration for creating a container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Image to run.
    pub image: ImageTag,
    /// Labels to apply.
    pub labels: HashMap<String, String>,
    /// Published ports.
    pub ports: Vec<PortMapping>,
    /// Remove the container once it exits.
    pub auto_remove: bool,
}

/// Port mapping configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host_port: u16,
    pub container_port: u16,
    pub protocol: Protocol,
    /// Host interface to bind to.
    pub host_ip: String,
}

impl PortMapping {
    pub fn tcp(binding: PortBinding, host_ip: &str) -> Self {
        Self {
            host_port: binding.host_port,
            container_port: binding.container_port,
            protocol: Protocol::Tcp,
            host_ip: host_ip.to_string(),
        }
    }

    /// Engine key for the exposed port, e.g. `80/tcp`.
    pub fn port_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

/// Network protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("tcp"),
        }
    }
}

/// Container state as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Unknown,
}

impl ContainerState {
    pub fn from_engine(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "removing" => ContainerState::Removing,
            "exited" | "stopped" => ContainerState::Exited,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }

    /// Whether the container may still be serving traffic.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            ContainerState::Running | ContainerState::Paused | ContainerState::Restarting
        )
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerState::Created => "created",
            ContainerState::Running => "running",
            ContainerState::Paused => "paused",
            ContainerState::Restarting => "restarting",
            ContainerState::Removing => "removing",
            ContainerState::Exited => "exited",
            ContainerState::Dead => "dead",
            ContainerState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Options passed to an image build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Tag applied to the result.
    pub tag: ImageTag,
    /// Suppress verbose build output.
    pub quiet: bool,
    /// Remove intermediate containers after a successful build.
    pub remove_intermediate: bool,
    /// Always remove intermediate containers, even on failure.
    pub force_remove_intermediate: bool,
    /// Refresh base images even if present locally.
    pub pull: bool,
}

impl BuildOptions {
    /// Options used for every deployment build.
    pub fn for_deploy(tag: ImageTag) -> Self {
        Self {
            tag,
            quiet: false,
            remove_intermediate: true,
            force_remove_intermediate: true,
            pull: true,
        }
    }
}

/// One item of build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// Raw log text, copied to the caller's sink unchanged.
    Output(String),
    /// The engine reported the ID of the produced image.
    Built(ImageId),
}

/// Stream of build output.
pub type BuildStream = Pin<Box<dyn Stream<Item = Result<BuildEvent, ImageError>> + Send>>;

/// How a container exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitStatus {
    pub code: i64,
    /// Engine-reported error message, if any.
    pub error: Option<String>,
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        self.code == 0 && self.error.is_none()
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit code {}", self.code)?;
        if let Some(ref error) = self.error {
            write!(f, " ({})", error)?;
        }
        Ok(())
    }
}

/// Runtime metadata.
#[derive(Debug, Clone)]
pub struct RuntimeMetadata {
    /// Runtime name (e.g., "Docker", "Podman").
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub os: String,
    pub arch: String,
}
