//! Parsing and validation of `tsbuild.toml` project configuration files.
//!
//! This crate reads the optional project configuration into a strongly-typed
//! [`ProjectConfig`] and owns the naming convention that maps a
//! (target, format) pair to its output directory and compiler configuration
//! file.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE};
pub use resolve::{resolve_bin_paths, resolve_paths, tsconfig_name, ResolvedPaths};
pub use types::*;
