//! Resolution of file paths reported by tools.

use std::path::{Component, Path, PathBuf};

/// Resolves a reported file against the linter's working directory.
///
/// Absolute paths pass through. A relative path is joined onto `cwd`; when
/// that does not exist, leading characters are dropped one at a time and the
/// remainder tried again, so tool-specific prefixes (`./`, `a/` from diff
/// output, a different checkout root) still land on a real file. When no
/// candidate exists the reported path is returned as is.
pub fn resolve_reported_path(file: &str, cwd: &Path, exists: impl Fn(&Path) -> bool) -> PathBuf {
    let reported = Path::new(file);
    if reported.is_absolute() {
        return reported.to_path_buf();
    }
    for (offset, _) in file.char_indices() {
        let suffix = Path::new(&file[offset..]);
        if suffix.is_absolute() {
            continue;
        }
        let candidate = normalize(&cwd.join(suffix));
        if exists(&candidate) {
            return candidate;
        }
    }
    reported.to_path_buf()
}

/// Lexically removes `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
