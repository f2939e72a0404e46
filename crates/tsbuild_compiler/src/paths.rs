//! Lexical path helpers shared by project loading and output writing.

use std::path::{Component, Path, PathBuf};

/// Resolves `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Computes `path` relative to `base`, both taken lexically.
///
/// Returns a `/`-separated path, using `..` to climb out of `base`.
pub fn relative_path(path: &Path, base: &Path) -> String {
    let path = normalize(path);
    let base = normalize(base);
    let path_parts: Vec<_> = path.components().collect();
    let base_parts: Vec<_> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = std::iter::repeat("..".to_string())
        .take(base_parts.len() - common)
        .collect();
    parts.extend(
        path_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// The deepest directory containing every path in `paths`.
pub fn common_ancestor<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    let mut iter = paths.into_iter();
    let mut ancestor = iter.next()?.parent()?.to_path_buf();
    for path in iter {
        while !path.starts_with(&ancestor) {
            if !ancestor.pop() {
                return None;
            }
        }
    }
    Some(ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_parent_and_current() {
        assert_eq!(
            normalize(Path::new("/proj/tsconfig/../src/./a.ts")),
            PathBuf::from("/proj/src/a.ts")
        );
        assert_eq!(normalize(Path::new("../x/../y")), PathBuf::from("../y"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn relative_sibling_and_child() {
        assert_eq!(
            relative_path(Path::new("/proj/src/util/int.ts"), Path::new("/proj/src")),
            "util/int.ts"
        );
        assert_eq!(
            relative_path(Path::new("/proj/src/a.ts"), Path::new("/proj/targets/node")),
            "../../src/a.ts"
        );
        assert_eq!(relative_path(Path::new("/a"), Path::new("/a")), ".");
    }

    #[test]
    fn common_ancestor_of_sources() {
        let paths = [
            PathBuf::from("/proj/src/a.ts"),
            PathBuf::from("/proj/src/util/b.ts"),
            PathBuf::from("/proj/src/io/c.ts"),
        ];
        assert_eq!(
            common_ancestor(paths.iter().map(PathBuf::as_path)),
            Some(PathBuf::from("/proj/src"))
        );
        assert_eq!(common_ancestor(std::iter::empty::<&Path>()), None);
    }
}
