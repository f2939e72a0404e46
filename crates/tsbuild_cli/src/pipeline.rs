//! Shared helpers for CLI commands: project root and configuration
//! resolution, logging setup and the target/format matrix.

use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;
use tsbuild_common::TaskKey;
use tsbuild_config::{load_config_from_str, ProjectConfig, CONFIG_FILE};

use crate::{GlobalArgs, MatrixArgs};

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise warnings and errors are shown, or
/// everything from debug up with `--verbose`.
pub fn init_logging(global: &GlobalArgs) {
    let default = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .init();
}

/// Walks up from `start` looking for the nearest directory containing
/// `tsbuild.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}

/// A project root together with the configuration loaded for it.
#[derive(Debug)]
pub struct LoadedProject {
    /// Directory layout paths are relative to.
    pub root: PathBuf,
    /// The configuration file that was read, if any.
    pub config_file: Option<PathBuf>,
    /// The parsed configuration, defaults when no file was read.
    pub config: ProjectConfig,
}

/// Resolves the project root and its configuration from global CLI args.
///
/// With `--config`, a file is loaded as the configuration and its directory
/// is the root; a directory is the root itself. Otherwise the nearest
/// ancestor holding `tsbuild.toml` is used, falling back to the current
/// directory with default settings.
pub fn load_project(global: &GlobalArgs) -> Result<LoadedProject, Box<dyn std::error::Error>> {
    let (root, config_file) = match &global.config {
        Some(config_path) => {
            let p = std::path::absolute(config_path)?;
            if p.is_dir() {
                let file = p.join(CONFIG_FILE);
                (p, file.is_file().then_some(file))
            } else {
                let root = p
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                (root, Some(p))
            }
        }
        None => {
            let cwd = std::env::current_dir()?;
            match find_project_root(&cwd) {
                Some(root) => {
                    let file = root.join(CONFIG_FILE);
                    (root, Some(file))
                }
                None => (cwd, None),
            }
        }
    };

    let config = match &config_file {
        Some(file) => {
            let content = std::fs::read_to_string(file)
                .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
            load_config_from_str(&content)?
        }
        None => ProjectConfig::default(),
    };
    Ok(LoadedProject {
        root,
        config_file,
        config,
    })
}

/// Every `(target, format)` pair of the matrix, in argument order, without
/// duplicates.
pub fn task_keys(matrix: &MatrixArgs) -> Vec<TaskKey> {
    let mut keys: Vec<TaskKey> = Vec::new();
    for target in &matrix.targets {
        for format in &matrix.formats {
            let key = TaskKey::new(target.clone(), *format);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    keys
}

/// Global flags a delegated child needs to behave like this process.
///
/// The child is pointed at the exact configuration file this process read,
/// or at the project root when none was read. Color is pinned to the
/// parent's decision since the child's stderr is inherited and may not look
/// like a terminal to it.
pub fn child_global_args(global: &GlobalArgs, project: &LoadedProject) -> Vec<String> {
    let config = project.config_file.as_deref().unwrap_or(&project.root);
    let mut args = vec![
        "--config".to_string(),
        config.to_string_lossy().into_owned(),
        "--color".to_string(),
        if global.color { "always" } else { "never" }.to_string(),
    ];
    if global.quiet {
        args.push("--quiet".to_string());
    }
    if global.verbose {
        args.push("--verbose".to_string());
    }
    args
}
