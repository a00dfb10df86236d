//! Discovery of external executables used by the engine.

use std::path::{Path, PathBuf};

/// Returns the first candidate program found on `PATH`.
pub fn find_on_path(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|candidate| which::which(candidate).ok())
}

/// Returns true when `path` names an existing file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
