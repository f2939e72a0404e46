//! Fan-out of one compilation into three joined write pipelines.

use std::path::{Path, PathBuf};

use futures::stream::{self, TryStreamExt};
use tsbuild_compiler::{CompilationOutputSet, Compiler, EmitStream, Project};

use crate::dest::{write_error, write_output, OutputFile};
use crate::error::BuildError;
use crate::mapfile::MapFileTransform;
use crate::sourcemap_stage::{SourceMapStage, SOURCE_ROOT};

/// Writes in flight per pipeline.
pub const WRITE_CONCURRENCY: usize = 16;

/// Files written by one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutStats {
    /// Sources copied to `<out>/src`.
    pub sources: usize,
    /// Declaration files and their maps.
    pub declarations: usize,
    /// Code files and their maps.
    pub code: usize,
    /// Every path written, sources first.
    pub outputs: Vec<PathBuf>,
}

impl FanOutStats {
    /// Merges another fan-out (e.g. the bin sub-task) into this one.
    pub fn absorb(&mut self, other: FanOutStats) {
        self.sources += other.sources;
        self.declarations += other.declarations;
        self.code += other.code;
        self.outputs.extend(other.outputs);
    }
}

/// Compiles `project` with `compiler` and writes everything into `out_dir`.
pub async fn compile_into(
    compiler: &dyn Compiler,
    project: &Project,
    out_dir: &Path,
) -> Result<FanOutStats, BuildError> {
    let output = compiler.compile(project);
    fan_out(out_dir, project, output).await
}

/// Drains `output` into `out_dir` through three concurrent pipelines.
///
/// Resolves once sources, declarations and code are all written. The first
/// failing pipeline fails the whole fan-out; the others are dropped.
pub async fn fan_out(
    out_dir: &Path,
    project: &Project,
    output: CompilationOutputSet,
) -> Result<FanOutStats, BuildError> {
    let CompilationOutputSet {
        code, declarations, ..
    } = output;

    let declaration_stage = SourceMapStage::new(&project.root_dir, MapFileTransform::Identity);
    let code_stage = SourceMapStage::new(&project.root_dir, MapFileTransform::for_project(project));

    let (sources, declarations, code) = futures::try_join!(
        copy_sources(out_dir, project),
        write_stream(out_dir, declarations, &declaration_stage),
        write_stream(out_dir, code, &code_stage),
    )?;

    let stats = FanOutStats {
        sources: sources.len(),
        declarations: declarations.len(),
        code: code.len(),
        outputs: [sources, declarations, code].concat(),
    };
    tracing::debug!(
        out = %out_dir.display(),
        sources = stats.sources,
        declarations = stats.declarations,
        code = stats.code,
        "fan-out complete"
    );
    Ok(stats)
}

/// Copies every project source verbatim to `<out_dir>/src/<relative path>`.
async fn copy_sources(out_dir: &Path, project: &Project) -> Result<Vec<PathBuf>, BuildError> {
    let src_dir = out_dir.join(SOURCE_ROOT);
    let copies: Vec<(PathBuf, PathBuf)> = project
        .sources
        .iter()
        .filter_map(|source| match project.relative_source(source) {
            Some(rel) => Some((source.clone(), src_dir.join(rel))),
            None => {
                tracing::warn!(
                    source = %source.display(),
                    root = %project.root_dir.display(),
                    "source outside root directory; not copied"
                );
                None
            }
        })
        .collect();

    stream::iter(copies.into_iter().map(Ok::<_, BuildError>))
        .map_ok(|(from, to)| async move {
            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| write_error(parent, e))?;
            }
            tokio::fs::copy(&from, &to)
                .await
                .map_err(|e| write_error(&to, e))?;
            Ok::<_, BuildError>(to)
        })
        .try_buffer_unordered(WRITE_CONCURRENCY)
        .try_collect()
        .await
}

/// Runs one emitted stream through the map-write and destination stages.
async fn write_stream(
    out_dir: &Path,
    files: EmitStream,
    stage: &SourceMapStage,
) -> Result<Vec<PathBuf>, BuildError> {
    let written: Vec<Vec<PathBuf>> = files
        .map_err(BuildError::from)
        .map_ok(|file| {
            let outputs: Vec<OutputFile> = stage.apply(file);
            async move {
                let mut paths = Vec::with_capacity(outputs.len());
                for output in outputs {
                    paths.push(write_output(out_dir, output).await?);
                }
                Ok::<_, BuildError>(paths)
            }
        })
        .try_buffer_unordered(WRITE_CONCURRENCY)
        .try_collect()
        .await?;
    Ok(written.into_iter().flatten().collect())
}
