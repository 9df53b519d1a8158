// ABOUTME: Hook command implementation.
// ABOUTME: Interprets a stored webhook delivery and deploys push events.

use std::path::Path;

use super::deploy::run_request;
use crate::cli::TargetArgs;
use hookd::config::Config;
use hookd::error::Result;
use hookd::output::Output;
use hookd::webhook::{HookAction, parse_hook};
use tokio::io::AsyncReadExt;

pub async fn hook(
    config: &Config,
    event: &str,
    payload: &Path,
    target: &TargetArgs,
    output: Output,
) -> Result<()> {
    let body = read_payload(payload).await?;

    match parse_hook(event, &body, &target.ports, target.auth.as_deref())? {
        HookAction::Acknowledge => {
            output.success(&format!("Event '{}' acknowledged", event));
            Ok(())
        }
        HookAction::Deploy(request) => run_request(config, request, target.detach, output).await,
    }
}

async fn read_payload(path: &Path) -> std::io::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut body = Vec::new();
        tokio::io::stdin().read_to_end(&mut body).await?;
        Ok(body)
    } else {
        tokio::fs::read(path).await
    }
}
