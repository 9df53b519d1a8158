// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports the orchestrator, its stages, and the handle for a launched container.

mod builder;
mod deployment;
mod error;
mod handle;
mod lifecycle;
mod lock;
mod orchestrator;
mod request;
mod state;
mod transitions;

pub use builder::ImageBuilder;
pub use deployment::Deployment;
pub use error::{BuildError, DeployError, DeployStage, LaunchError, RetireError, WaitError};
pub use handle::{DeploymentHandle, DeploymentSummary};
pub use lifecycle::{
    DEFAULT_STOP_TIMEOUT, LABEL_COMMIT, LABEL_PROJECT, LifecycleManager, RunResult,
};
pub use lock::{DeployLock, DeployLocks, LockInfo};
pub use orchestrator::{
    DEFAULT_CLONE_TIMEOUT, DEFAULT_DEADLINE, DeploySettings, DeploymentOrchestrator,
};
pub use request::{DeploymentRequest, LogSink};
pub use state::{Built, Fetched, HoldsImage, Initialized, Launched, Retired};
pub use transitions::TransitionResult;
