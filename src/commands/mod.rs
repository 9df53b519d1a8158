// ABOUTME: Command module aggregator for the hookd CLI.
// ABOUTME: Re-exports deploy, hook, and status command handlers.

mod deploy;
mod hook;
mod runtime_connection;
mod status;

pub use deploy::deploy;
pub use hook::hook;
pub use status::status;
