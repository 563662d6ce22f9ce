//! Filesystem utilities.

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the home directory.
///
/// Paths without a leading `~` component, or a `~` when no home directory
/// can be determined, are returned unchanged.
pub fn expand_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }

    path.to_path_buf()
}

/// Whether `path` names a YAML document by its extension.
pub fn is_yaml(path: impl AsRef<Path>) -> bool {
    matches!(
        path.as_ref().extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml")
    )
}
