// ABOUTME: Library root for hookd - webhook-triggered build and deploy agent.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod error;
pub mod output;
pub mod runtime;
pub mod source;
pub mod types;
pub mod webhook;
