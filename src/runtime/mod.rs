// ABOUTME: Container engine access for Docker and Podman.
// ABOUTME: Capability traits, the bollard implementation, and socket detection.

mod bollard;
mod detection;
mod error;
mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use detection::{DetectionError, detect_local, resolve};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::{
    BuildEvent, BuildOptions, BuildStream, ContainerConfig, ContainerError, ContainerFilters,
    ContainerOps, ContainerState, ContainerSummary, DEFAULT_HOST_IP, Engine, ExitStatus,
    ImageError, ImageOps, PortMapping, Protocol, RuntimeInfo as RuntimeInfoTrait,
    RuntimeInfoError, RuntimeMetadata,
};
pub use types::{RuntimeConfig, RuntimeInfo, RuntimeType};

