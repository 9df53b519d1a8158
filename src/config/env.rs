// ABOUTME: Environment variables that override file configuration.
// ABOUTME: Empty values are treated as unset.

use std::path::PathBuf;

pub const ENV_STORAGE_ROOT: &str = "HOOKD_STORAGE_ROOT";
pub const ENV_SOCKET: &str = "HOOKD_SOCKET";

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn storage_root() -> Option<PathBuf> {
    non_empty(ENV_STORAGE_ROOT).map(PathBuf::from)
}

pub fn socket() -> Option<String> {
    non_empty(ENV_SOCKET)
}
