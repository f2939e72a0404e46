//! Errors raised while loading a project or running the compiler.

use std::path::PathBuf;

/// Errors produced by project loading and compiler invocation.
///
/// Values are cheap to rebuild, so the same failure can end both output
/// streams of one compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Reading a configuration, source or emitted file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A compiler configuration file is malformed or inconsistent.
    #[error("invalid compiler configuration {path}: {reason}")]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// The compiler program could not be started.
    #[error("failed to run `{program}`: {reason}")]
    Spawn {
        /// The program that was executed.
        program: String,
        /// Why it could not be started.
        reason: String,
    },

    /// The compiler ran and reported fatal diagnostics.
    #[error("compilation failed with {errors} error(s)")]
    Failed {
        /// Number of error diagnostics reported.
        errors: usize,
    },

    /// The compiler driver stopped before finishing its output.
    #[error("compiler output ended unexpectedly")]
    Aborted,
}

impl CompileError {
    /// Builds an [`Io`](CompileError::Io) error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    /// Rebuilds an equivalent error, for ending several streams with one
    /// failure. I/O sources keep their kind and message.
    pub fn replicate(&self) -> Self {
        match self {
            CompileError::Io { path, source } => CompileError::Io {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            CompileError::Config { path, reason } => CompileError::Config {
                path: path.clone(),
                reason: reason.clone(),
            },
            CompileError::Spawn { program, reason } => CompileError::Spawn {
                program: program.clone(),
                reason: reason.clone(),
            },
            CompileError::Failed { errors } => CompileError::Failed { errors: *errors },
            CompileError::Aborted => CompileError::Aborted,
        }
    }

    /// Builds a [`Config`](CompileError::Config) error.
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CompileError::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
