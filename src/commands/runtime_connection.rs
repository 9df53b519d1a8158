// ABOUTME: Shared helper for connecting to the local container engine.
// ABOUTME: Used by every command that talks to Docker or Podman.

use hookd::config::Config;
use hookd::error::Result;
use hookd::output::Output;
use hookd::runtime::{BollardRuntime, RuntimeError, RuntimeInfoTrait, resolve};

/// Resolve the configured engine, connect, and check that it answers.
pub async fn connect_to_runtime(config: &Config, output: &Output) -> Result<BollardRuntime> {
    output.progress("  → Detecting runtime...");
    let info = resolve(&config.runtime_config()).map_err(RuntimeError::from)?;

    output.progress(&format!(
        "  → Found {} at {}",
        info.runtime_type.display_name(),
        info.socket_path
    ));

    let runtime = BollardRuntime::connect(&info).map_err(RuntimeError::from)?;
    runtime.ping().await.map_err(RuntimeError::from)?;

    Ok(runtime)
}
