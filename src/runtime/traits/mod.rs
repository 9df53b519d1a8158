// ABOUTME: Composable capability traits for container engines.
// ABOUTME: Defines ImageOps, ContainerOps, and RuntimeInfo.

mod container;
mod image;
mod runtime_info;
mod shared_types;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use image::{ImageError, ImageOps};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// Everything a deployment needs from an engine.
pub trait Engine: ImageOps + ContainerOps + Send + Sync + 'static {}

impl<T: ImageOps + ContainerOps + Send + Sync + 'static> Engine for T {}
