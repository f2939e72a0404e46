//! `include`/`exclude` wildcard patterns from `tsconfig.json`.
//!
//! Supported syntax: `*` (any run of characters within a segment), `?` (one
//! character within a segment) and `**/` (any number of directories). The
//! leading wildcard-free segments of a pattern, `..` included, form its root
//! directory; matching happens on paths relative to that root.

use std::path::{Path, PathBuf};

use crate::paths::normalize;

/// A compiled wildcard pattern anchored at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    root: PathBuf,
    segments: Vec<String>,
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?'])
}

impl Pattern {
    /// Compiles an `include` pattern relative to `base`.
    ///
    /// A final segment without wildcards and without an extension names a
    /// directory and matches every file beneath it.
    pub fn include(base: &Path, pattern: &str) -> Self {
        let mut compiled = Self::compile(base, pattern);
        let names_directory = match compiled.segments.last() {
            None => true,
            Some(last) => !has_wildcard(last) && !last.contains('.'),
        };
        if names_directory {
            compiled.segments.push("**".to_string());
            compiled.segments.push("*".to_string());
        }
        compiled
    }

    /// Compiles an `exclude` pattern relative to `base`.
    ///
    /// Exclusions match a path when they match it or any of its ancestors.
    pub fn exclude(base: &Path, pattern: &str) -> Self {
        Self::compile(base, pattern)
    }

    fn compile(base: &Path, pattern: &str) -> Self {
        let mut root = if Path::new(pattern).has_root() {
            PathBuf::from("/")
        } else {
            base.to_path_buf()
        };
        let mut segments = Vec::new();
        let mut literal_prefix = true;
        for segment in pattern.split(['/', '\\']) {
            if segment.is_empty() || segment == "." {
                continue;
            }
            if literal_prefix && !has_wildcard(segment) {
                root.push(segment);
                continue;
            }
            literal_prefix = false;
            segments.push(segment.to_string());
        }
        // An all-literal pattern names a single file or directory: keep its
        // last component as the thing to match.
        let mut root = normalize(&root);
        if segments.is_empty() {
            if let Some(name) = root.file_name().map(|n| n.to_string_lossy().into_owned()) {
                root.pop();
                segments.push(name);
            }
        }
        Self { root, segments }
    }

    /// The directory matching starts from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` if the pattern matches `path` exactly.
    pub fn matches(&self, path: &Path) -> bool {
        match self.relative_segments(path) {
            Some(parts) => match_segments(&self.segments, &parts),
            None => false,
        }
    }

    /// Returns `true` if the pattern matches `path` or one of its ancestors.
    pub fn matches_path_or_ancestor(&self, path: &Path) -> bool {
        let Some(parts) = self.relative_segments(path) else {
            return false;
        };
        (1..=parts.len()).any(|n| match_segments(&self.segments, &parts[..n]))
    }

    fn relative_segments(&self, path: &Path) -> Option<Vec<String>> {
        let path = normalize(path);
        let rel = path.strip_prefix(&self.root).ok()?;
        Some(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect(),
        )
    }
}

fn match_segments(pattern: &[String], parts: &[String]) -> bool {
    match pattern.split_first() {
        None => parts.is_empty(),
        Some((first, rest)) if first == "**" => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((first, rest)) => match parts.split_first() {
            Some((part, remaining)) => {
                match_segment(first.as_bytes(), part.as_bytes()) && match_segments(rest, remaining)
            }
            None => false,
        },
    }
}

fn match_segment(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.first(), text.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            match_segment(&pattern[1..], text)
                || (!text.is_empty() && match_segment(pattern, &text[1..]))
        }
        (Some(b'?'), Some(_)) => match_segment(&pattern[1..], &text[1..]),
        (Some(p), Some(t)) if p == t => match_segment(&pattern[1..], &text[1..]),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_relative_include() {
        let p = Pattern::include(Path::new("/proj/tsconfig"), "../src/**/*.ts");
        assert_eq!(p.root(), Path::new("/proj/src"));
        assert!(p.matches(Path::new("/proj/src/table.ts")));
        assert!(p.matches(Path::new("/proj/src/util/bn.ts")));
        assert!(!p.matches(Path::new("/proj/src/util/bn.js")));
        assert!(!p.matches(Path::new("/proj/test/a.ts")));
    }

    #[test]
    fn directory_include_expands() {
        let p = Pattern::include(Path::new("/proj"), "src");
        assert!(p.matches(Path::new("/proj/src/a.ts")));
        assert!(p.matches(Path::new("/proj/src/deep/b.tsx")));
    }

    #[test]
    fn single_file_include() {
        let p = Pattern::include(Path::new("/proj"), "src/bin/arrow2csv.ts");
        assert!(p.matches(Path::new("/proj/src/bin/arrow2csv.ts")));
        assert!(!p.matches(Path::new("/proj/src/bin/other.ts")));
    }

    #[test]
    fn question_mark_and_star() {
        let p = Pattern::include(Path::new("/p"), "v?/*.d.ts");
        assert!(p.matches(Path::new("/p/v1/index.d.ts")));
        assert!(!p.matches(Path::new("/p/v10/index.d.ts")));
    }

    #[test]
    fn exclude_matches_ancestors() {
        let p = Pattern::exclude(Path::new("/proj"), "node_modules");
        assert!(p.matches_path_or_ancestor(Path::new("/proj/node_modules/x/index.d.ts")));
        assert!(!p.matches_path_or_ancestor(Path::new("/proj/src/node.ts")));
    }

    #[test]
    fn exclude_with_wildcards() {
        let p = Pattern::exclude(Path::new("/proj"), "src/**/*.test.ts");
        assert!(p.matches_path_or_ancestor(Path::new("/proj/src/a/b.test.ts")));
        assert!(!p.matches_path_or_ancestor(Path::new("/proj/src/a/b.ts")));
    }

    #[test]
    fn absolute_pattern_ignores_base() {
        let p = Pattern::exclude(Path::new("/proj"), "/proj/targets");
        assert_eq!(p.root(), Path::new("/proj"));
        assert!(p.matches_path_or_ancestor(Path::new("/proj/targets/node/cjs/a.ts")));
    }

    #[test]
    fn double_star_matches_zero_dirs() {
        let p = Pattern::include(Path::new("/r"), "**/*");
        assert!(p.matches(Path::new("/r/top.ts")));
        assert!(p.matches(Path::new("/r/a/b/c.ts")));
    }
}
