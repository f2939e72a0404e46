//! The destination-write stage.

use std::path::{Component, Path, PathBuf};

use crate::error::BuildError;

/// A prepared file: its path below the destination root and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path relative to the destination root.
    pub path: PathBuf,
    /// Final contents.
    pub contents: Vec<u8>,
}

impl OutputFile {
    /// Creates an output file.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Writes `file` below `out_dir`, creating parent directories, and returns
/// the path written.
///
/// Paths that would escape `out_dir` are refused.
pub async fn write_output(out_dir: &Path, file: OutputFile) -> Result<PathBuf, BuildError> {
    let dest = out_dir.join(&file.path);
    let escapes = file
        .path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(BuildError::Write {
            path: dest,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "output path leaves the output directory",
            ),
        });
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_error(parent, e))?;
    }
    tokio::fs::write(&dest, &file.contents)
        .await
        .map_err(|e| write_error(&dest, e))?;
    tracing::debug!(path = %dest.display(), bytes = file.contents.len(), "wrote");
    Ok(dest)
}

pub(crate) fn write_error(path: &Path, source: std::io::Error) -> BuildError {
    BuildError::Write {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_output(dir.path(), OutputFile::new("util/int.js", "x"))
            .await
            .unwrap();
        assert_eq!(written, dir.path().join("util/int.js"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("util/int.js")).unwrap(),
            "x"
        );
    }

    #[tokio::test]
    async fn refuses_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_output(dir.path(), OutputFile::new("../evil.js", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Write { .. }));
    }

    #[tokio::test]
    async fn blocked_destination_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("util"), "a file, not a directory").unwrap();
        let err = write_output(dir.path(), OutputFile::new("util/int.js", "x"))
            .await
            .unwrap_err();
        match err {
            BuildError::Write { path, .. } => assert!(path.ends_with("util")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
