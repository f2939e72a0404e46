//! Input fingerprinting for build stamps.
//!
//! A fingerprint covers everything that decides a task's output: labelled
//! settings (compiler command, overrides) plus the path and content of every
//! input file, in the order given.

use std::path::Path;

use tsbuild_common::{ContentHash, ContentHasher};

use crate::error::CacheError;

/// Accumulates task inputs into a single [`ContentHash`].
pub struct Fingerprinter {
    hasher: ContentHasher,
    files: usize,
}

impl Fingerprinter {
    /// Creates an empty fingerprinter.
    pub fn new() -> Self {
        Self {
            hasher: ContentHasher::new(),
            files: 0,
        }
    }

    /// Adds a named setting.
    pub fn add_value(&mut self, name: &str, value: &str) {
        self.hasher.update_str(name);
        self.hasher.update_str(value);
    }

    /// Adds a file's path and content.
    pub fn add_file(&mut self, path: &Path) -> Result<(), CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.hasher.update_str(&path.to_string_lossy());
        self.hasher.update(&content);
        self.files += 1;
        Ok(())
    }

    /// Adds several files, stopping at the first unreadable one.
    pub fn add_files<'a>(
        &mut self,
        paths: impl IntoIterator<Item = &'a Path>,
    ) -> Result<(), CacheError> {
        for path in paths {
            self.add_file(path)?;
        }
        Ok(())
    }

    /// Number of files hashed so far.
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Finishes and returns the fingerprint.
    pub fn finish(&self) -> ContentHash {
        self.hasher.finish()
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts");
        std::fs::write(&path, "export const a = 1;").unwrap();

        let mut f1 = Fingerprinter::new();
        f1.add_value("target", "es2015");
        f1.add_file(&path).unwrap();
        let mut f2 = Fingerprinter::new();
        f2.add_value("target", "es2015");
        f2.add_file(&path).unwrap();

        assert_eq!(f1.finish(), f2.finish());
        assert_eq!(f1.file_count(), 1);
    }

    #[test]
    fn content_change_changes_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts");
        std::fs::write(&path, "export const a = 1;").unwrap();
        let mut before = Fingerprinter::new();
        before.add_file(&path).unwrap();

        std::fs::write(&path, "export const a = 2;").unwrap();
        let mut after = Fingerprinter::new();
        after.add_file(&path).unwrap();

        assert_ne!(before.finish(), after.finish());
    }

    #[test]
    fn setting_change_changes_fingerprint() {
        let mut a = Fingerprinter::new();
        a.add_value("target", "es5");
        let mut b = Fingerprinter::new();
        b.add_value("target", "esnext");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn missing_file_errors() {
        let mut f = Fingerprinter::new();
        let err = f.add_file(Path::new("/nonexistent/a.ts")).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
    }

    #[test]
    fn add_files_counts_all() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.ts");
        let b = dir.path().join("b.ts");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "b").unwrap();
        let mut f = Fingerprinter::new();
        f.add_files([a.as_path(), b.as_path()]).unwrap();
        assert_eq!(f.file_count(), 2);
    }
}
