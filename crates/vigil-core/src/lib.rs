//! vigil-core — shared types and configuration for Vigil.
//!
//! Everything here is plain data: the probe and health report shapes that
//! flow between crates and over the wire, and [`VigilConfig`], which is
//! loaded from an optional TOML file and overlaid with `VIGIL_*`
//! environment variables.

pub mod config;
pub mod types;

pub use config::{ConfigError, StoreBackend, VigilConfig};
pub use types::*;
