//! The map-write stage: finalizes source maps and links them from their file.

use std::path::{Path, PathBuf};

use tsbuild_compiler::paths::relative_path;
use tsbuild_compiler::EmittedFile;

use crate::dest::OutputFile;
use crate::mapfile::MapFileTransform;

/// Source root written into every map.
pub const SOURCE_ROOT: &str = "src";

const URL_PREFIXES: &[&str] = &["//# sourceMappingURL=", "//@ sourceMappingURL="];

/// Writes external source maps for emitted files.
///
/// Maps carry no embedded source content; their `sources` are relative to
/// the project root directory under [`SOURCE_ROOT`], matching where the
/// sources pipeline copies them.
#[derive(Debug, Clone)]
pub struct SourceMapStage {
    root_dir: PathBuf,
    transform: MapFileTransform,
}

impl SourceMapStage {
    /// Creates a stage for a project rooted at `root_dir`.
    pub fn new(root_dir: &Path, transform: MapFileTransform) -> Self {
        Self {
            root_dir: root_dir.to_path_buf(),
            transform,
        }
    }

    /// Turns one emitted file into the file itself plus its map, if it has one.
    pub fn apply(&self, file: EmittedFile) -> Vec<OutputFile> {
        let EmittedFile {
            path,
            contents,
            source_map,
        } = file;
        let Some(mut map) = source_map else {
            return vec![OutputFile::new(path, contents)];
        };

        let mut default_map = path.clone().into_os_string();
        default_map.push(".map");
        let map_path = self.transform.apply(Path::new(&default_map));
        let map_name = map_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        map.file = path.file_name().map(|n| n.to_string_lossy().into_owned());
        map.source_root = Some(SOURCE_ROOT.to_string());
        map.sources = map
            .sources
            .iter()
            .map(|source| relative_path(Path::new(source), &self.root_dir))
            .collect();
        map.sources_content = None;

        let mut code = strip_mapping_url(&contents);
        if !code.is_empty() && !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(&format!("//# sourceMappingURL={map_name}"));

        vec![
            OutputFile::new(path, code),
            OutputFile::new(map_path, map.to_json()),
        ]
    }
}

fn strip_mapping_url(contents: &str) -> String {
    let mut out = String::with_capacity(contents.len());
    for line in contents.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if URL_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            continue;
        }
        out.push_str(line);
    }
    out
}
