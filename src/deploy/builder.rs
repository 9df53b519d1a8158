// ABOUTME: Builds a tagged image from a workspace directory.
// ABOUTME: Archives the directory as a tar context and streams engine output to a log sink.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::runtime::{BuildEvent, BuildOptions, ImageOps};
use crate::types::{ImageId, ImageTag};

use super::error::BuildError;

/// Drives engine builds for deployments.
pub struct ImageBuilder<R> {
    runtime: Arc<R>,
}

impl<R> Clone for ImageBuilder<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<R: ImageOps> ImageBuilder<R> {
    pub fn new(runtime: Arc<R>) -> Self {
        Self { runtime }
    }

    /// Build `workspace` into an image tagged `tag`, copying every chunk of
    /// build output into `sink` unchanged.
    ///
    /// Returns the image ID when the engine reports one. The image is left
    /// in place on failure; removing it is the caller's decision.
    ///
    /// Dropping the returned future abandons the build: the engine stream is
    /// dropped with it and the engine side stops on its own.
    pub async fn build<W>(
        &self,
        workspace: &Path,
        tag: &ImageTag,
        sink: &mut W,
    ) -> Result<Option<ImageId>, BuildError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let context = archive_workspace(workspace.to_path_buf()).await?;
        info!(tag = %tag, context_bytes = context.len(), "building image");

        let options = BuildOptions::for_deploy(tag.clone());
        let mut stream = self
            .runtime
            .build_image(context, &options)
            .await
            .map_err(BuildError::Engine)?;

        let mut image_id = None;
        while let Some(event) = stream.next().await {
            match event.map_err(BuildError::Engine)? {
                BuildEvent::Output(chunk) => {
                    sink.write_all(chunk.as_bytes())
                        .await
                        .map_err(BuildError::LogCopy)?;
                }
                BuildEvent::Built(id) => {
                    debug!(image = %id.short(), "engine reported image id");
                    image_id = Some(id);
                }
            }
        }
        sink.flush().await.map_err(BuildError::LogCopy)?;

        Ok(image_id)
    }
}

/// Pack the whole workspace into an in-memory tar archive.
async fn archive_workspace(workspace: PathBuf) -> Result<Vec<u8>, BuildError> {
    let path = workspace.clone();
    tokio::task::spawn_blocking(move || tar_directory(&path))
        .await
        .map_err(|e| BuildError::Archive {
            path: workspace.clone(),
            source: std::io::Error::other(e),
        })?
        .map_err(|source| BuildError::Archive {
            path: workspace,
            source,
        })
}

fn tar_directory(dir: &Path) -> std::io::Result<Vec<u8>> {
    let mut archive = tar::Builder::new(Vec::new());
    archive.follow_symlinks(false);
    archive.append_dir_all(".", dir)?;
    archive.into_inner()
}
