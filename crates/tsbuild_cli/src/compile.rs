//! `tsbuild compile`: builds every requested `(target, format)` pair.
//!
//! 1. Resolve the project root and load `tsbuild.toml`
//! 2. Expand the target/format matrix into task keys
//! 3. Run one memoized task per key, delegating to child processes when
//!    more than one pair was requested
//! 4. Report a status line per pair

use std::sync::Arc;

use futures::future::join_all;
use tsbuild_cache::TaskCache;
use tsbuild_compiler::TscCompiler;
use tsbuild_diagnostics::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
use tsbuild_pipeline::{ChildProcessPolicy, TaskEnv, TypescriptTask};

use crate::pipeline::{child_global_args, load_project, task_keys};
use crate::{CompileArgs, GlobalArgs, ReportFormat};

/// Runs the `tsbuild compile` command.
///
/// Returns exit code 0 if every pair compiled, 1 otherwise.
pub fn run(args: &CompileArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let (root, config) = (&project.root, &project.config);
    let keys = task_keys(&args.matrix);
    tracing::debug!(root = %root.display(), pairs = keys.len(), "starting compile");

    if !global.quiet && !config.project.name.is_empty() {
        eprintln!("   Building {}", config.project.name);
    }

    let renderer: Arc<dyn DiagnosticRenderer> = match args.report {
        ReportFormat::Text => Arc::new(TerminalRenderer::new(global.color)),
        ReportFormat::Json => Arc::new(JsonRenderer),
    };
    let compiler = TscCompiler::new(config.compiler.command.clone()).with_reporter(renderer);

    let mut command_args = Vec::new();
    if args.force {
        command_args.push("--force".to_string());
    }
    command_args.extend([
        "--report".to_string(),
        match args.report {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        }
        .to_string(),
    ]);
    let policy = ChildProcessPolicy::new(
        config.delegation.mode,
        args.matrix.targets.iter().cloned(),
        args.matrix.formats.iter().copied(),
        std::env::current_exe()?,
        child_global_args(global, &project),
    )
    .with_command_args(command_args);

    let mut env = TaskEnv::from_config(config, Arc::new(compiler), Arc::new(policy), root);
    env.force = args.force;
    let task = TypescriptTask::new(env, Arc::new(TaskCache::new()));

    let runtime = tokio::runtime::Runtime::new()?;
    let outcomes = runtime.block_on(join_all(keys.iter().map(|key| task.run(key.clone()))));

    let mut failed = 0usize;
    for (key, outcome) in keys.iter().zip(&outcomes) {
        match outcome {
            Ok(()) => {
                if !global.quiet {
                    eprintln!("    Compiled {key}");
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("error: {key}: {e}");
            }
        }
    }

    if failed > 0 {
        eprintln!("error: {failed} of {} builds failed", keys.len());
        return Ok(1);
    }
    Ok(0)
}
