// ABOUTME: Errors for malformed deployment input at the process boundary.
// ABOUTME: Raised before any network or engine activity starts.

use crate::types::{CommitHashError, PortBindingError, ProjectRefError};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid project: {0}")]
    Project(#[from] ProjectRefError),

    #[error("invalid commit: {0}")]
    Commit(#[from] CommitHashError),

    #[error("invalid port mapping: {0}")]
    Ports(#[from] PortBindingError),

    #[error("auth is not valid base64: {0}")]
    AuthEncoding(#[from] base64::DecodeError),

    #[error("invalid format of auth: expected basic://user:pass or token://value")]
    AuthFormat,

    #[error("invalid event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("event payload is missing {0}")]
    MissingField(&'static str),

    #[error("invalid event '{0}'")]
    UnsupportedEvent(String),
}
