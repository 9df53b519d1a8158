// ABOUTME: Deployment state types for the type state pattern.
// ABOUTME: Each state carries the data produced by the stage that reached it.

use std::path::PathBuf;

use crate::types::{ContainerId, ImageId};

/// Request accepted, nothing done yet.
/// Available actions: `fetch()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Source checked out into a workspace.
/// Available actions: `build()`
#[derive(Debug, Clone)]
pub struct Fetched {
    pub(crate) workspace: PathBuf,
}

/// Image built and tagged.
/// Available actions: `retire()`, `rollback()`
#[derive(Debug, Clone)]
pub struct Built {
    pub(crate) workspace: PathBuf,
    pub(crate) image_id: Option<ImageId>,
}

/// Previous containers of the project stopped.
/// Available actions: `launch()`, `rollback()`
#[derive(Debug, Clone)]
pub struct Retired {
    pub(crate) workspace: PathBuf,
    pub(crate) image_id: Option<ImageId>,
    pub(crate) retired: usize,
}

/// New container running.
/// Available actions: `detach()`
#[derive(Debug, Clone)]
pub struct Launched {
    pub(crate) workspace: PathBuf,
    pub(crate) image_id: Option<ImageId>,
    pub(crate) retired: usize,
    pub(crate) container: ContainerId,
}

/// States in which a failure leaves a (possibly partial) image behind.
pub trait HoldsImage {}

impl HoldsImage for Fetched {}
impl HoldsImage for Built {}
impl HoldsImage for Retired {}
