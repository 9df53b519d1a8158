// ABOUTME: Generic deployment struct parameterized by state.
// ABOUTME: Holds the request identity; the state type holds what each stage produced.

use std::path::Path;

use crate::types::{CommitHash, ContainerId, ImageTag, PortBinding, ProjectRef};

use super::state::{Built, Fetched, Initialized, Launched, Retired};

/// A deployment in progress, parameterized by its current state.
///
/// Transitions consume the deployment, so a stage can only run once the
/// stage before it has produced its data.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) project: ProjectRef,
    pub(crate) commit: CommitHash,
    pub(crate) ports: Vec<PortBinding>,
    pub(crate) state: S,
}

impl Deployment<Initialized> {
    pub fn new(project: ProjectRef, commit: CommitHash, ports: Vec<PortBinding>) -> Self {
        Deployment {
            project,
            commit,
            ports,
            state: Initialized,
        }
    }
}

impl<S> Deployment<S> {
    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    pub fn commit(&self) -> &CommitHash {
        &self.commit
    }

    pub fn ports(&self) -> &[PortBinding] {
        &self.ports
    }

    /// The tag this deployment builds and runs.
    pub fn image_tag(&self) -> ImageTag {
        ImageTag::new(&self.project, &self.commit)
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl Deployment<Fetched> {
    pub fn workspace(&self) -> &Path {
        &self.state.workspace
    }
}

impl Deployment<Built> {
    pub fn workspace(&self) -> &Path {
        &self.state.workspace
    }
}

impl Deployment<Retired> {
    pub fn workspace(&self) -> &Path {
        &self.state.workspace
    }

    /// Number of previous containers that were stopped.
    pub fn retired(&self) -> usize {
        self.state.retired
    }
}

impl Deployment<Launched> {
    pub fn workspace(&self) -> &Path {
        &self.state.workspace
    }

    pub fn retired(&self) -> usize {
        self.state.retired
    }

    pub fn container(&self) -> &ContainerId {
        &self.state.container
    }
}
