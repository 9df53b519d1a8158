// ABOUTME: Deploy command implementation.
// ABOUTME: Runs one deployment request and optionally waits for the container to exit.

use std::sync::Arc;

use super::runtime_connection::connect_to_runtime;
use crate::cli::TargetArgs;
use hookd::config::Config;
use hookd::deploy::{DeploymentOrchestrator, DeploymentRequest};
use hookd::error::{Error, Result};
use hookd::output::{Output, OutputMode};
use hookd::source::GitTransport;
use hookd::webhook::parse_request;

/// Deploy `commit` of `project` from command-line arguments.
pub async fn deploy(
    config: &Config,
    project: &str,
    commit: &str,
    target: &TargetArgs,
    output: Output,
) -> Result<()> {
    let request = parse_request(project, commit, &target.ports, target.auth.as_deref())?;
    run_request(config, request, target.detach, output).await
}

/// Execute a validated request against the local engine.
pub async fn run_request(
    config: &Config,
    request: DeploymentRequest,
    detach: bool,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    output.progress(&format!(
        "Deploying {}@{}",
        request.project, request.commit
    ));

    let runtime = Arc::new(connect_to_runtime(config, &output).await?);
    let orchestrator = DeploymentOrchestrator::new(
        runtime,
        Arc::new(GitTransport::default()),
        &config.deploy_settings(),
    );

    // Build logs only make sense for a human watching.
    let request = if output.mode() == OutputMode::Normal {
        request.with_log_sink(tokio::io::stderr())
    } else {
        request
    };

    let handle = orchestrator.run(request).await?;
    let summary = handle.summary();
    if summary.retired > 0 {
        output.progress(&format!("  → Retired {} old container(s)", summary.retired));
    }

    if detach {
        output.success_with(
            &format!("Started {} as {}", summary.image, handle.container().short()),
            Some(&summary),
        );
        return Ok(());
    }

    output.progress(&format!(
        "  → Container {} running, waiting for it to exit...",
        handle.container().short()
    ));
    let status = handle.wait().await?;
    if status.success() {
        output.success_with(
            &format!("Container {} exited cleanly", summary.container),
            Some(&summary),
        );
        Ok(())
    } else {
        Err(Error::ContainerExit {
            container: summary.container,
            code: status.code,
        })
    }
}
