// ABOUTME: Application-wide error types for hookd.
// ABOUTME: Uses thiserror; wraps every module error the CLI can surface.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::{DeployError, WaitError};
use crate::runtime::{ContainerError, RuntimeError};
use crate::webhook::RequestError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0}")]
    Request(#[from] RequestError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("container exited abnormally: {0}")]
    Wait(#[from] WaitError),

    #[error("container {container} exited with code {code}")]
    ContainerExit { container: String, code: i64 },

    #[error("failed to query containers: {0}")]
    Containers(#[from] ContainerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
