//! The bin sub-task: script entry points compiled next to a primary build.

use std::path::Path;

use tsbuild_common::TaskKey;
use tsbuild_compiler::CompilerOverrides;
use tsbuild_config::{resolve_bin_paths, BinConfig, LayoutConfig, ResolvedPaths};

use crate::error::BuildError;

/// What the bin sub-task of one primary compilation compiles, and where to.
#[derive(Debug, Clone, PartialEq)]
pub struct BinPlan {
    /// Bin configuration file and output directory, rooted at the project.
    pub paths: ResolvedPaths,
    /// Options applied on top of the bin configuration.
    pub overrides: CompilerOverrides,
}

/// Overrides for the bin compilation of `caller`: its target.
pub fn bin_overrides(caller: &TaskKey) -> CompilerOverrides {
    CompilerOverrides::new().with("target", caller.target.as_str())
}

/// Plans the bin sub-task of `caller`, whose unrooted paths are `primary`.
///
/// Returns `None` when the sub-task is disabled, or when its configuration
/// file is missing and not required.
pub fn plan_bin(
    layout: &LayoutConfig,
    bin: &BinConfig,
    project_root: &Path,
    primary: &ResolvedPaths,
    caller: &TaskKey,
) -> Result<Option<BinPlan>, BuildError> {
    if !bin.enabled {
        tracing::debug!(key = %caller, "bin sub-task disabled");
        return Ok(None);
    }
    let bin_key = bin.key()?;
    let paths = resolve_bin_paths(layout, bin, &bin_key, primary).rooted(project_root);
    if !bin.required && !paths.tsconfig_path.is_file() {
        tracing::debug!(
            key = %caller,
            config = %paths.tsconfig_path.display(),
            "no bin configuration; skipping"
        );
        return Ok(None);
    }
    Ok(Some(BinPlan {
        paths,
        overrides: bin_overrides(caller),
    }))
}
