// ABOUTME: Input to one deployment run: what to deploy, how to publish it, where logs go.
// ABOUTME: Built from validated types; parsing of raw input happens at the boundary.

use std::fmt;

use tokio::io::AsyncWrite;

use crate::source::Credentials;
use crate::types::{CommitHash, PortBinding, ProjectRef};

/// Destination for raw build output.
pub type LogSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Everything one deployment run needs.
pub struct DeploymentRequest {
    pub project: ProjectRef,
    pub commit: CommitHash,
    pub ports: Vec<PortBinding>,
    pub credentials: Option<Credentials>,
    pub log_sink: LogSink,
}

impl DeploymentRequest {
    /// A request with no ports, no credentials, and build output discarded.
    pub fn new(project: ProjectRef, commit: CommitHash) -> Self {
        Self {
            project,
            commit,
            ports: Vec::new(),
            credentials: None,
            log_sink: Box::new(tokio::io::sink()),
        }
    }

    pub fn with_ports(mut self, ports: Vec<PortBinding>) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_log_sink(mut self, sink: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        self.log_sink = Box::new(sink);
        self
    }
}

impl fmt::Debug for DeploymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentRequest")
            .field("project", &self.project)
            .field("commit", &self.commit)
            .field("ports", &self.ports)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
