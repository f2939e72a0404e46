//! The `tsc` command-line compiler as a [`Compiler`].
//!
//! Each compilation runs the configured command against the project's
//! configuration with a private staging directory as `--outDir`. Diagnostics
//! are parsed and reported while the compiler runs; the staged files are
//! streamed out once it exits successfully.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tsbuild_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink};

use crate::compiler::Compiler;
use crate::emit::{classify, CompilationOutputSet, EmitSender, EmittedFile, OutputKind};
use crate::error::CompileError;
use crate::paths::normalize;
use crate::sourcemap::SourceMap;
use crate::tsc_output::TscOutputParser;
use crate::tsconfig::Project;

/// Runs an external `tsc`-compatible command.
#[derive(Clone)]
pub struct TscCompiler {
    command: Vec<String>,
    reporter: Option<Arc<dyn DiagnosticRenderer>>,
}

impl TscCompiler {
    /// Creates a compiler running `command` (program followed by leading
    /// arguments, e.g. `["npx", "tsc"]`).
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            reporter: None,
        }
    }

    /// Prints every diagnostic to stderr with `renderer` as it arrives.
    pub fn with_reporter(mut self, renderer: Arc<dyn DiagnosticRenderer>) -> Self {
        self.reporter = Some(renderer);
        self
    }

    /// The arguments appended to the command for `project`.
    pub fn args(&self, project: &Project, staging: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-p".into(),
            project.config_path.to_string_lossy().into_owned(),
            "--outDir".into(),
            staging.to_string_lossy().into_owned(),
            "--rootDir".into(),
            project.root_dir.to_string_lossy().into_owned(),
            "--sourceMap".into(),
            "--declaration".into(),
            "--declarationMap".into(),
            "--inlineSourceMap".into(),
            "false".into(),
            "--inlineSources".into(),
            "false".into(),
            "--pretty".into(),
            "false".into(),
        ];
        args.extend(project.overrides.to_args());
        args
    }
}

impl Compiler for TscCompiler {
    /// Starts the compiler on a Tokio task; must be called within a runtime.
    fn compile(&self, project: &Project) -> CompilationOutputSet {
        let (sender, output) = CompilationOutputSet::channel();
        let compiler = self.clone();
        let project = project.clone();
        tokio::spawn(async move {
            let diagnostics = Arc::clone(sender.diagnostics());
            match compiler.drive(&project, &diagnostics).await {
                Ok(files) => {
                    let mut emitted = 0usize;
                    for file in files {
                        if sender.emit(file) != OutputKind::Other {
                            emitted += 1;
                        }
                    }
                    tracing::debug!(
                        config = %project.config_path.display(),
                        emitted,
                        "compiler finished"
                    );
                    sender.finish();
                }
                Err(err) => {
                    tracing::debug!(
                        config = %project.config_path.display(),
                        error = %err,
                        "compiler failed"
                    );
                    sender.fail(|| err.replicate());
                }
            }
        });
        output
    }

    fn identity(&self) -> String {
        self.command.join(" ")
    }
}

impl TscCompiler {
    async fn drive(
        &self,
        project: &Project,
        diagnostics: &DiagnosticSink,
    ) -> Result<Vec<EmittedFile>, CompileError> {
        let (program, leading) = self
            .command
            .split_first()
            .ok_or_else(|| CompileError::Spawn {
                program: String::new(),
                reason: "empty compiler command".to_string(),
            })?;

        let staging = tempfile::Builder::new()
            .prefix("tsbuild-")
            .tempdir()
            .map_err(|e| CompileError::io(std::env::temp_dir(), e))?;

        let mut child = Command::new(program)
            .args(leading)
            .args(self.args(project, staging.path()))
            .current_dir(&project.config_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CompileError::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::warn!(target: "tsbuild::tsc", "{line}");
                }
            });
        }

        let mut parser = TscOutputParser::new(&project.config_dir);
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| CompileError::io(&project.config_path, e))?
            {
                if let Some(diag) = parser.push_line(&line) {
                    self.report(diagnostics, diag);
                }
            }
        }
        if let Some(diag) = parser.finish() {
            self.report(diagnostics, diag);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| CompileError::io(&project.config_path, e))?;
        if !status.success() {
            return Err(CompileError::Failed {
                errors: diagnostics.error_count().max(1),
            });
        }

        let staging_dir = staging.path().to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_staged(&staging_dir))
            .await
            .map_err(|_| CompileError::Aborted)??;
        drop(staging);
        Ok(files)
    }

    fn report(&self, diagnostics: &DiagnosticSink, diag: Diagnostic) {
        if let Some(reporter) = &self.reporter {
            eprint!("{}", reporter.render(&diag));
        }
        diagnostics.emit(diag);
    }
}

/// Reads every code and declaration file under `root`, attaching its map.
fn collect_staged(root: &Path) -> Result<Vec<EmittedFile>, CompileError> {
    let mut paths = Vec::new();
    list_files(root, &mut paths)?;
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        if !matches!(classify(&path), OutputKind::Code | OutputKind::Declaration) {
            continue;
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| CompileError::io(&path, e))?;
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        let mut file = EmittedFile::new(relative, contents);
        if let Some(map) = read_map(&path)? {
            file = file.with_source_map(map);
        }
        files.push(file);
    }
    Ok(files)
}

fn list_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CompileError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CompileError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| CompileError::io(dir, e))?.path();
        if path.is_dir() {
            list_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Loads `<file>.map` and resolves its sources to absolute paths.
fn read_map(file: &Path) -> Result<Option<SourceMap>, CompileError> {
    let mut map_path = file.as_os_str().to_owned();
    map_path.push(".map");
    let map_path = PathBuf::from(map_path);
    if !map_path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&map_path).map_err(|e| CompileError::io(&map_path, e))?;
    let mut map = SourceMap::parse(&map_path, &text)?;

    let map_dir = map_path.parent().unwrap_or(Path::new(""));
    let source_base = match map.source_root.as_deref() {
        Some(root) if !root.is_empty() => map_dir.join(root),
        _ => map_dir.to_path_buf(),
    };
    map.sources = map
        .sources
        .iter()
        .map(|s| normalize(&source_base.join(s)).to_string_lossy().into_owned())
        .collect();
    map.source_root = None;
    Ok(Some(map))
}
