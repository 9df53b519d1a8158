// ABOUTME: Host-to-container port binding parsed from "hostPort:containerPort".
// ABOUTME: Rejects malformed pairs and duplicate container ports in one request.

use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortBindingError {
    #[error("port mapping '{0}' must look like hostPort:containerPort")]
    Format(String),

    #[error("invalid port number '{value}' in mapping '{mapping}'")]
    InvalidPort { mapping: String, value: String },

    #[error("container port {0} is mapped more than once")]
    DuplicateContainerPort(u16),
}

/// One published port: traffic on `host_port` reaches `container_port/tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortBinding {
    pub host_port: u16,
    pub container_port: u16,
}

impl PortBinding {
    pub fn new(host_port: u16, container_port: u16) -> Self {
        Self {
            host_port,
            container_port,
        }
    }

    pub fn parse(spec: &str) -> Result<Self, PortBindingError> {
        let spec = spec.trim();
        let (host, container) = spec
            .split_once(':')
            .ok_or_else(|| PortBindingError::Format(spec.to_string()))?;
        if container.contains(':') {
            return Err(PortBindingError::Format(spec.to_string()));
        }

        let port = |value: &str| {
            value
                .parse::<u16>()
                .map_err(|_| PortBindingError::InvalidPort {
                    mapping: spec.to_string(),
                    value: value.to_string(),
                })
        };

        Ok(Self::new(port(host)?, port(container)?))
    }
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)
    }
}

/// Parse every mapping of a request, failing on the first bad one.
pub fn parse_port_bindings<S: AsRef<str>>(specs: &[S]) -> Result<Vec<PortBinding>, PortBindingError> {
    let mut seen = HashSet::new();
    let mut bindings = Vec::with_capacity(specs.len());
    for spec in specs {
        let binding = PortBinding::parse(spec.as_ref())?;
        if !seen.insert(binding.container_port) {
            return Err(PortBindingError::DuplicateContainerPort(
                binding.container_port,
            ));
        }
        bindings.push(binding);
    }
    Ok(bindings)
}
