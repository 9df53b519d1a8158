// ABOUTME: Status command implementation.
// ABOUTME: Lists the containers currently belonging to a project.

use std::sync::Arc;

use super::runtime_connection::connect_to_runtime;
use hookd::config::Config;
use hookd::deploy::{LABEL_COMMIT, LifecycleManager};
use hookd::error::{Error, Result};
use hookd::output::Output;
use hookd::types::ProjectRef;
use hookd::webhook::RequestError;
use serde::Serialize;

#[derive(Serialize)]
struct ContainerStatus {
    id: String,
    image: String,
    commit: Option<String>,
    state: String,
    status: String,
}

pub async fn status(config: &Config, project: &str, output: Output) -> Result<()> {
    let project = ProjectRef::new(project).map_err(|e| Error::Request(RequestError::from(e)))?;
    let runtime = Arc::new(connect_to_runtime(config, &output).await?);
    let lifecycle = LifecycleManager::new(runtime);

    let containers: Vec<ContainerStatus> = lifecycle
        .managed_containers(&project)
        .await?
        .into_iter()
        .map(|c| ContainerStatus {
            id: c.id.short().to_string(),
            image: c.image,
            commit: c.labels.get(LABEL_COMMIT).cloned(),
            state: c.state.to_string(),
            status: c.status,
        })
        .collect();

    for c in &containers {
        output.progress(&format!("  {}  {:<10} {}  {}", c.id, c.state, c.image, c.status));
    }

    let running = containers.iter().filter(|c| c.state == "running").count();
    output.success_with(
        &format!(
            "{}: {} container(s), {} running",
            project,
            containers.len(),
            running
        ),
        Some(&containers),
    );
    Ok(())
}
