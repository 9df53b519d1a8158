// ABOUTME: Configuration types and parsing for hookd.yml.
// ABOUTME: Handles YAML parsing, defaults, environment overrides, and validation.

mod deserialize;
mod env;
mod init;

pub use env::{ENV_SOCKET, ENV_STORAGE_ROOT};
pub use init::init_config;

use crate::deploy::{DEFAULT_CLONE_TIMEOUT, DEFAULT_DEADLINE, DEFAULT_STOP_TIMEOUT, DeploySettings};
use crate::error::{Error, Result};
use crate::runtime::{DEFAULT_HOST_IP, RuntimeConfig, RuntimeType};
use deserialize::{deserialize_host_ip, deserialize_storage_root};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "hookd.yml";
pub const CONFIG_FILENAME_ALT: &str = "hookd.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".hookd/config.yml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory workspaces are checked out under.
    #[serde(
        default = "default_storage_root",
        deserialize_with = "deserialize_storage_root"
    )]
    pub storage_root: PathBuf,

    #[serde(default = "default_deadline", with = "humantime_serde")]
    pub deadline: Duration,

    #[serde(default = "default_clone_timeout", with = "humantime_serde")]
    pub clone_timeout: Duration,

    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    #[serde(default = "default_host_ip", deserialize_with = "deserialize_host_ip")]
    pub host_ip: String,

    #[serde(default)]
    pub serialize_deploys: bool,

    /// Explicit engine type; auto-detected when absent.
    #[serde(default)]
    pub runtime: Option<RuntimeType>,

    /// Explicit engine socket path.
    #[serde(default)]
    pub socket: Option<String>,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("repos")
}

fn default_deadline() -> Duration {
    DEFAULT_DEADLINE
}

fn default_clone_timeout() -> Duration {
    DEFAULT_CLONE_TIMEOUT
}

fn default_stop_timeout() -> Duration {
    DEFAULT_STOP_TIMEOUT
}

fn default_host_ip() -> String {
    DEFAULT_HOST_IP.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_root: default_storage_root(),
            deadline: default_deadline(),
            clone_timeout: default_clone_timeout(),
            stop_timeout: default_stop_timeout(),
            host_ip: default_host_ip(),
            serialize_deploys: false,
            runtime: None,
            socket: None,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find the config file in `dir`, if any.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Load the config from `dir`, falling back to defaults when no file
    /// exists, then apply environment overrides.
    pub fn discover(dir: &Path) -> Result<Self> {
        let mut config = match Self::find(dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)?
            }
            None => {
                tracing::debug!(dir = %dir.display(), "no config file, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `HOOKD_STORAGE_ROOT` and `HOOKD_SOCKET`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(root) = env::storage_root() {
            self.storage_root = root;
        }
        if let Some(socket) = env::socket() {
            self.socket = Some(socket);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.deadline.is_zero() {
            return Err(Error::InvalidConfig("deadline must be positive".to_string()));
        }
        if self.clone_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "clone_timeout must be positive".to_string(),
            ));
        }
        if self.clone_timeout >= self.deadline {
            return Err(Error::InvalidConfig(format!(
                "clone_timeout ({:?}) must be shorter than deadline ({:?})",
                self.clone_timeout, self.deadline
            )));
        }
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            runtime: self.runtime,
            socket: self.socket.clone(),
        }
    }

    pub fn deploy_settings(&self) -> DeploySettings {
        DeploySettings {
            storage_root: self.storage_root.clone(),
            deadline: self.deadline,
            clone_timeout: self.clone_timeout,
            stop_timeout: self.stop_timeout,
            host_ip: self.host_ip.clone(),
            serialize_deploys: self.serialize_deploys,
        }
    }
}
