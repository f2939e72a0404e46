//! Errors that fail a compile task.

use std::path::PathBuf;
use std::sync::Arc;

use tsbuild_common::TaskKey;
use tsbuild_compiler::CompileError;
use tsbuild_config::ConfigError;

/// Why a compile task failed.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The build configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The project could not be loaded or the compiler failed.
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// An output file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A task delegated to a child process did not succeed.
    #[error("child process for {key} failed: {reason}")]
    Delegation {
        /// The delegated task.
        key: TaskKey,
        /// Exit status or spawn failure.
        reason: String,
    },
}

/// The settled result of one task, shared by every subscriber.
pub type TaskOutcome = Result<(), Arc<BuildError>>;
