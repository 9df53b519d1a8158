// ABOUTME: Turns raw webhook input into validated deployment requests.
// ABOUTME: Decodes auth, parses ports and push payloads, and classifies events.

mod auth;
mod error;
mod event;

pub use auth::{decode_auth, encode_auth, parse_auth};
pub use error::RequestError;
pub use event::{HookEvent, PushEvent, Repository};

use crate::deploy::DeploymentRequest;
use crate::types::{CommitHash, ProjectRef, parse_port_bindings};

/// What a webhook delivery asks for.
#[derive(Debug)]
pub enum HookAction {
    /// Deploy the pushed commit.
    Deploy(DeploymentRequest),
    /// Delivery check; nothing to do.
    Acknowledge,
}

/// Build a request from raw boundary values.
///
/// Ports and auth are validated before anything else so a malformed
/// request never reaches the network.
pub fn parse_request<S: AsRef<str>>(
    project: &str,
    commit: &str,
    ports: &[S],
    auth: Option<&str>,
) -> Result<DeploymentRequest, RequestError> {
    let ports = parse_port_bindings(ports)?;
    let credentials = match auth {
        Some(encoded) => decode_auth(encoded)?,
        None => None,
    };
    let project = ProjectRef::new(project)?;
    let commit = CommitHash::new(commit)?;

    Ok(DeploymentRequest::new(project, commit)
        .with_ports(ports)
        .with_credentials(credentials))
}

/// Interpret one webhook delivery.
pub fn parse_hook<S: AsRef<str>>(
    event: &str,
    payload: &[u8],
    ports: &[S],
    auth: Option<&str>,
) -> Result<HookAction, RequestError> {
    // Query-style parameters are checked even for events that do not deploy.
    parse_port_bindings(ports)?;
    if let Some(encoded) = auth {
        decode_auth(encoded)?;
    }

    match HookEvent::from_name(event)? {
        HookEvent::Ping => Ok(HookAction::Acknowledge),
        HookEvent::Push => {
            let push = PushEvent::from_json(payload)?;
            let request = parse_request(&push.project(), &push.after, ports, auth)?;
            Ok(HookAction::Deploy(request))
        }
    }
}
