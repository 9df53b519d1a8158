// ABOUTME: Image operations trait for container engines.
// ABOUTME: Build an image from a tar context and remove tagged images.

use super::shared_types::{BuildOptions, BuildStream};
use crate::types::ImageTag;
use async_trait::async_trait;

/// Image operations: build and remove.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Start a build from a tar archive of the build context.
    ///
    /// The returned stream yields build output until the engine finishes;
    /// an engine-reported build failure arrives as an `Err` item.
    async fn build_image(
        &self,
        context: Vec<u8>,
        options: &BuildOptions,
    ) -> Result<BuildStream, ImageError>;

    /// Remove an image by tag.
    async fn remove_image(
        &self,
        tag: &ImageTag,
        force: bool,
        prune_children: bool,
    ) -> Result<(), ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("image in use, cannot remove: {0}")]
    InUse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
