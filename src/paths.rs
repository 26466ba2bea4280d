//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

/// Base directory for persistent data (snapshots, exports).
///
/// Uses `LENSDESK_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/lensdesk` or
/// `~/.local/share/lensdesk`.
pub(crate) fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LENSDESK_DATA_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local")
                .join("share")
        })
        .join("lensdesk")
}

/// Base directory for configuration.
///
/// Uses `LENSDESK_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/lensdesk`
/// or `~/.config/lensdesk`.
pub(crate) fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LENSDESK_CONFIG_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".config")
        })
        .join("lensdesk")
}
