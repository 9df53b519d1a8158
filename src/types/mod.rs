// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Project references, commit hashes, image tags, and port bindings.

mod commit_hash;
mod id;
mod image_tag;
mod port_binding;
mod project_ref;

pub use commit_hash::{CommitHash, CommitHashError};
pub use id::{ContainerId, ImageId};
pub use image_tag::ImageTag;
pub use port_binding::{PortBinding, PortBindingError, parse_port_bindings};
pub use project_ref::{ProjectRef, ProjectRefError};
