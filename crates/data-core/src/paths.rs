use dirs::home_dir;
use std::path::{Path, PathBuf};

use data_schema::Handle;

/// Descriptor filename at the dataset root.
pub const DATAFILE: &str = "Datafile";

/// Manifest filename at the dataset root.
pub const MANIFEST: &str = "Manifest";

/// Manifest location used by early releases; not read any more.
pub const LEGACY_MANIFEST: &str = ".data/manifest.yml";

/// Directory (relative to the working directory) holding installed datasets.
pub const DATASETS_DIR: &str = "datasets";

/// Config file path: `$DATA_CONFIG`, else `~/.dataconfig`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("DATA_CONFIG") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".dataconfig"))
}

/// Where `handle` is installed below `cwd`: `datasets/<author>/<name>`.
pub fn install_path(cwd: &Path, handle: &Handle) -> PathBuf {
    cwd.join(DATASETS_DIR).join(&handle.author).join(&handle.name)
}

/// Datafile of an installed dataset.
pub fn installed_datafile(cwd: &Path, handle: &Handle) -> PathBuf {
    install_path(cwd, handle).join(DATAFILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_path_layout() {
        let h = Handle::parse("jbenet/foo@1.0").unwrap();
        assert_eq!(
            install_path(Path::new("/work"), &h),
            PathBuf::from("/work/datasets/jbenet/foo")
        );
        assert_eq!(
            installed_datafile(Path::new("/work"), &h),
            PathBuf::from("/work/datasets/jbenet/foo/Datafile")
        );
    }
}
