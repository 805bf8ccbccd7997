use ramplo_core::paths::RAMPLO_DIR;
use std::path::{Path, PathBuf};

/// Resolve the RampLO root directory.
///
/// Priority:
/// 1. `--root` flag / `RAMPLO_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.ramplo/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd).unwrap_or(cwd)
}

/// The nearest ancestor of `start` (inclusive) containing `.ramplo/`.
pub fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(RAMPLO_DIR).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn finds_ramplo_dir_above_start() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".ramplo")).unwrap();
        let deep = dir.path().join("a/b/c");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_root_from(&deep).as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_marker_finds_nothing() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("x");
        std::fs::create_dir_all(&deep).unwrap();
        assert_ne!(find_root_from(&deep).as_deref(), Some(dir.path()));
        assert_ne!(find_root_from(&deep), Some(deep));
    }
}
