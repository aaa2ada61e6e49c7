// src/path_utils.rs

//! Path normalization shared by the tree, the matcher and the watcher.

use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Lexically resolve `.` and `..` without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn make_absolute(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&root.join(path))
    }
}

/// Forward-slash, lowercase form of a path. Tree keys are segments of this.
pub fn cache_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

/// Split a path into the segments the tree is keyed by.
pub fn key_segments(path: &Path) -> Vec<String> {
    cache_key(path).split('/').map(str::to_string).collect()
}

/// Rewrite separators into the platform's native form.
pub fn to_native(path: &Path) -> PathBuf {
    if MAIN_SEPARATOR == '\\' {
        PathBuf::from(path.to_string_lossy().replace('/', "\\"))
    } else {
        path.to_path_buf()
    }
}

/// `path` with `prefix` stripped, comparing components the way tree keys do
/// (case-insensitive).
pub fn strip_prefix_ignore_case(path: &Path, prefix: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    for expected in prefix.components() {
        let actual = components.next()?;
        if cache_key(Path::new(actual.as_os_str())) != cache_key(Path::new(expected.as_os_str())) {
            return None;
        }
    }
    Some(components.as_path().to_path_buf())
}
