// ABOUTME: Config scaffolding for a new agent directory.
// ABOUTME: Creates a commented hookd.yml template.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

/// Write a template config into `dir` and return its path.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, TEMPLATE)?;
    Ok(config_path)
}

const TEMPLATE: &str = r#"# Directory workspaces are checked out under (<root>/<project>/<commit>).
storage_root: repos

# Upper bound on fetch, build, retire, and launch together.
deadline: 30m

# Upper bound on the clone alone; must be shorter than the deadline.
clone_timeout: 1m

# Grace period before a retiring container is killed.
stop_timeout: 10s

# Host interface published ports bind to.
host_ip: 0.0.0.0

# Queue deployments of the same project and commit instead of running them side by side.
serialize_deploys: false

# Container engine; auto-detected when unset.
# runtime: podman
# socket: /run/podman/podman.sock
"#;
