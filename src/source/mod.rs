// ABOUTME: Source fetching: credentials, clone transport, and workspace management.
// ABOUTME: Exports the WorkspaceFetcher and the SourceTransport contract it drives.

mod auth;
mod error;
mod fetcher;
mod transport;

pub use auth::{BasicAuth, CloneTarget, Credentials, TOKEN_USERNAME};
pub use error::FetchError;
pub use fetcher::WorkspaceFetcher;
pub use transport::{DEFAULT_SUBMODULE_DEPTH, GitTransport, SourceTransport, TransportError};
