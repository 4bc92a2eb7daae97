//! Core types and configuration for dockscript.
//!
//! This crate defines the `dockscript.toml` schema ([`DockscriptConfig`])
//! and shared error types.

pub mod config;
pub mod error;

pub use config::{DockscriptConfig, RunConfig, ScriptConfig};
pub use error::{Error, Result};
