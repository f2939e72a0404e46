//! The naming convention from a task key to its output directory and
//! compiler configuration file.
//!
//! Resolution is pure: no file is touched and the same inputs always give the
//! same paths.

use std::path::{Path, PathBuf};
use tsbuild_common::TaskKey;

use crate::types::{BinConfig, LayoutConfig};

/// Where one compilation reads its configuration and writes its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// The key the configuration file was named after.
    pub key: TaskKey,
    /// Output directory.
    pub out_dir: PathBuf,
    /// Compiler configuration file.
    pub tsconfig_path: PathBuf,
}

impl ResolvedPaths {
    /// Prefixes both paths with `root` (the project directory).
    pub fn rooted(&self, root: &Path) -> Self {
        Self {
            key: self.key.clone(),
            out_dir: root.join(&self.out_dir),
            tsconfig_path: root.join(&self.tsconfig_path),
        }
    }
}

/// The stem of a compiler configuration name: `<target>-<format>`.
pub fn tsconfig_name(key: &TaskKey) -> String {
    key.file_stem()
}

/// Resolves `(target, format)` to `<targets_dir>/<target>/<format>` and
/// `<tsconfig_dir>/tsconfig.<target>-<format>.json`.
pub fn resolve_paths(layout: &LayoutConfig, key: &TaskKey) -> ResolvedPaths {
    ResolvedPaths {
        key: key.clone(),
        out_dir: layout
            .targets_dir
            .join(key.target.as_str())
            .join(key.format.as_str()),
        tsconfig_path: layout
            .tsconfig_dir
            .join(format!("tsconfig.{}.json", tsconfig_name(key))),
    }
}

/// Resolves the bin sub-task of a primary compilation.
///
/// The configuration is always named after `bin_key`; the output goes to
/// `<primary out_dir>/<bin.dir>`.
pub fn resolve_bin_paths(
    layout: &LayoutConfig,
    bin: &BinConfig,
    bin_key: &TaskKey,
    primary: &ResolvedPaths,
) -> ResolvedPaths {
    let config = resolve_paths(layout, bin_key);
    ResolvedPaths {
        key: config.key,
        out_dir: primary.out_dir.join(&bin.dir),
        tsconfig_path: config.tsconfig_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(t: &str, f: &str) -> TaskKey {
        TaskKey::parse(t, f).unwrap()
    }

    #[test]
    fn node_cjs_scenario() {
        let paths = resolve_paths(&LayoutConfig::default(), &key("node", "cjs"));
        assert_eq!(paths.out_dir, PathBuf::from("targets/node/cjs"));
        assert_eq!(
            paths.tsconfig_path,
            PathBuf::from("tsconfig/tsconfig.node-cjs.json")
        );
    }

    #[test]
    fn node_esm_uses_same_convention() {
        let paths = resolve_paths(&LayoutConfig::default(), &key("node", "esm"));
        assert_eq!(paths.out_dir, PathBuf::from("targets/node/esm"));
        assert_eq!(
            paths.tsconfig_path,
            PathBuf::from("tsconfig/tsconfig.node-esm.json")
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let layout = LayoutConfig::default();
        for (t, f) in [("node", "cjs"), ("es2015", "esm"), ("bin", "cjs")] {
            let a = resolve_paths(&layout, &key(t, f));
            let b = resolve_paths(&layout, &key(t, f));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn custom_layout() {
        let layout = LayoutConfig {
            targets_dir: PathBuf::from("dist"),
            tsconfig_dir: PathBuf::from("cfg"),
        };
        let paths = resolve_paths(&layout, &key("web", "esm"));
        assert_eq!(paths.out_dir, PathBuf::from("dist/web/esm"));
        assert_eq!(paths.tsconfig_path, PathBuf::from("cfg/tsconfig.web-esm.json"));
    }

    #[test]
    fn bin_paths_nest_under_primary() {
        let layout = LayoutConfig::default();
        let bin = BinConfig::default();
        let primary = resolve_paths(&layout, &key("es2015", "esm"));
        let bin_paths = resolve_bin_paths(&layout, &bin, &bin.key().unwrap(), &primary);
        assert_eq!(bin_paths.out_dir, PathBuf::from("targets/es2015/esm/bin"));
        assert_eq!(
            bin_paths.tsconfig_path,
            PathBuf::from("tsconfig/tsconfig.bin-cjs.json")
        );
        assert_eq!(bin_paths.key, key("bin", "cjs"));
    }

    #[test]
    fn rooted_prefixes_both() {
        let paths = resolve_paths(&LayoutConfig::default(), &key("node", "cjs"));
        let rooted = paths.rooted(Path::new("/proj"));
        assert_eq!(rooted.out_dir, PathBuf::from("/proj/targets/node/cjs"));
        assert_eq!(
            rooted.tsconfig_path,
            PathBuf::from("/proj/tsconfig/tsconfig.node-cjs.json")
        );
    }
}
