use std::path::{Path, PathBuf};

pub const RAMPLO_DIR: &str = ".ramplo";
pub const CONFIG_FILE: &str = ".ramplo/config.yaml";
pub const DEFAULT_DATABASE: &str = ".ramplo/ramplo.db";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path: absolute paths are kept, relative ones hang off `root`.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_relative_and_absolute() {
        let root = Path::new("/srv/ramplo");
        assert_eq!(
            resolve(root, Path::new(DEFAULT_DATABASE)),
            PathBuf::from("/srv/ramplo/.ramplo/ramplo.db")
        );
        assert_eq!(resolve(root, Path::new("/data/x.db")), PathBuf::from("/data/x.db"));
        assert_eq!(config_path(root), PathBuf::from("/srv/ramplo/.ramplo/config.yaml"));
    }
}
