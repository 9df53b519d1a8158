// ABOUTME: Which engine hookd deploys through and where its API socket lives.
// ABOUTME: Engine kind, the socket resolved at startup, and the hookd.yml override.

use serde::{Deserialize, Serialize};

/// Engine flavour behind the Docker-compatible API.
///
/// Spelled lowercase in `hookd.yml` (`runtime: podman`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Podman,
}

impl RuntimeType {
    /// Guess the engine from a socket path when `runtime` is not configured.
    pub fn from_socket_path(socket: &str) -> Self {
        if socket.contains("podman") {
            RuntimeType::Podman
        } else {
            RuntimeType::Docker
        }
    }

    /// Name used in progress output and engine metadata.
    pub fn display_name(self) -> &'static str {
        match self {
            RuntimeType::Docker => "Docker",
            RuntimeType::Podman => "Podman",
        }
    }
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeType::Docker => write!(f, "docker"),
            RuntimeType::Podman => write!(f, "podman"),
        }
    }
}

/// The engine every deployment of this process talks to.
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub runtime_type: RuntimeType,
    /// Unix socket of the engine API.
    pub socket_path: String,
}

/// Engine choice from `hookd.yml` and `HOOKD_SOCKET`. Unset fields fall back
/// to detecting a local socket.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub runtime: Option<RuntimeType>,
    pub socket: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_names_the_engine() {
        assert_eq!(
            RuntimeType::from_socket_path("/run/user/1000/podman/podman.sock"),
            RuntimeType::Podman
        );
        assert_eq!(
            RuntimeType::from_socket_path("/var/run/docker.sock"),
            RuntimeType::Docker
        );
        assert_eq!(
            RuntimeType::from_socket_path("/srv/engine.sock"),
            RuntimeType::Docker
        );
    }

    #[test]
    fn config_spelling_is_lowercase() {
        let parsed: RuntimeType = serde_yaml::from_str("podman").unwrap();
        assert_eq!(parsed, RuntimeType::Podman);
        assert_eq!(parsed.to_string(), "podman");
        assert_eq!(parsed.display_name(), "Podman");
    }
}
