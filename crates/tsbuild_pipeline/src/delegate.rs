//! Deciding whether a task runs here or in a child process.
//!
//! When one invocation asks for several `(target, format)` pairs, each pair
//! is handed to its own child process running the same executable narrowed to
//! that single pair. The child sees exactly one requested pair and compiles
//! it in-process.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Stdio;

use futures::future::{BoxFuture, FutureExt};
use tokio::process::Command;
use tsbuild_common::{ModuleFormat, Target, TaskKey};
use tsbuild_config::DelegationMode;

use crate::error::BuildError;

/// Where a task runs.
pub trait DelegationPolicy: Send + Sync {
    /// Returns `true` if `key` should be compiled by a child process.
    fn should_run_in_child_process(&self, key: &TaskKey) -> bool;

    /// Runs `command` for `key` in a child process and adopts its outcome.
    fn spawn(&self, command: &str, key: &TaskKey) -> BoxFuture<'static, Result<(), BuildError>>;
}

/// Always compiles in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverDelegate;

impl DelegationPolicy for NeverDelegate {
    fn should_run_in_child_process(&self, _key: &TaskKey) -> bool {
        false
    }

    fn spawn(&self, _command: &str, key: &TaskKey) -> BoxFuture<'static, Result<(), BuildError>> {
        let key = key.clone();
        async move {
            Err(BuildError::Delegation {
                key,
                reason: "delegation is disabled".to_string(),
            })
        }
        .boxed()
    }
}

/// Delegates based on what this process was asked to build.
#[derive(Debug, Clone)]
pub struct ChildProcessPolicy {
    mode: DelegationMode,
    targets: BTreeSet<Target>,
    formats: BTreeSet<ModuleFormat>,
    program: PathBuf,
    leading_args: Vec<String>,
    command_args: Vec<String>,
}

impl ChildProcessPolicy {
    /// Creates a policy for a process asked to build every combination of
    /// `targets` and `formats`, re-running `program` with `leading_args`
    /// (global flags such as `--config`) for delegated pairs.
    pub fn new(
        mode: DelegationMode,
        targets: impl IntoIterator<Item = Target>,
        formats: impl IntoIterator<Item = ModuleFormat>,
        program: PathBuf,
        leading_args: Vec<String>,
    ) -> Self {
        Self {
            mode,
            targets: targets.into_iter().collect(),
            formats: formats.into_iter().collect(),
            program,
            leading_args,
            command_args: Vec::new(),
        }
    }

    /// Arguments appended after the narrowed pair (e.g. `--force`).
    pub fn with_command_args(mut self, args: Vec<String>) -> Self {
        self.command_args = args;
        self
    }

    /// The full argument list of the child for `key`.
    pub fn child_args(&self, command: &str, key: &TaskKey) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend([
            command.to_string(),
            "--target".to_string(),
            key.target.to_string(),
            "--format".to_string(),
            key.format.to_string(),
        ]);
        args.extend(self.command_args.iter().cloned());
        args
    }
}

impl DelegationPolicy for ChildProcessPolicy {
    fn should_run_in_child_process(&self, key: &TaskKey) -> bool {
        if self.mode == DelegationMode::Never {
            return false;
        }
        if self.targets.len() > 1 || self.formats.len() > 1 {
            return true;
        }
        !(self.targets.contains(&key.target) && self.formats.contains(&key.format))
    }

    fn spawn(&self, command: &str, key: &TaskKey) -> BoxFuture<'static, Result<(), BuildError>> {
        let program = self.program.clone();
        let args = self.child_args(command, key);
        let key = key.clone();
        async move {
            tracing::info!(%key, program = %program.display(), "compiling in child process");
            let status = Command::new(&program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .status()
                .await
                .map_err(|e| BuildError::Delegation {
                    key: key.clone(),
                    reason: format!("failed to start {}: {e}", program.display()),
                })?;
            if status.success() {
                Ok(())
            } else {
                Err(BuildError::Delegation {
                    key,
                    reason: status.to_string(),
                })
            }
        }
        .boxed()
    }
}
