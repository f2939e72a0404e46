//! The map-file naming rule for emitted code.

use std::path::{Path, PathBuf};

use tsbuild_compiler::{ModuleKind, Project};

/// How a generated source map's file name is derived from the default
/// `<file>.map`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFileTransform {
    /// Keep the name (CommonJS-like output).
    Identity,
    /// Rewrite a trailing `.js.map` to `.mjs.map` (ECMAScript module output).
    Esm,
}

impl MapFileTransform {
    /// The transform for code compiled with `kind`.
    pub fn for_module_kind(kind: ModuleKind) -> Self {
        if kind.is_esm() {
            MapFileTransform::Esm
        } else {
            MapFileTransform::Identity
        }
    }

    /// The transform for a project's code output.
    ///
    /// Only a `module` option the configuration states explicitly selects
    /// ESM naming; a kind the compiler would merely default to keeps `.js.map`.
    pub fn for_project(project: &Project) -> Self {
        project
            .declared_module
            .map_or(MapFileTransform::Identity, Self::for_module_kind)
    }

    /// Applies the rule to a map file path. Only the end of the name is
    /// considered; directories are left alone.
    pub fn apply(self, map_path: &Path) -> PathBuf {
        match self {
            MapFileTransform::Identity => map_path.to_path_buf(),
            MapFileTransform::Esm => {
                let Some(name) = map_path.file_name().and_then(|n| n.to_str()) else {
                    return map_path.to_path_buf();
                };
                match name.strip_suffix(".js.map") {
                    Some(stem) => map_path.with_file_name(format!("{stem}.mjs.map")),
                    None => map_path.to_path_buf(),
                }
            }
        }
    }
}
