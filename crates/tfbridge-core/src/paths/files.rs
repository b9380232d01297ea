//! Data root and JSON config files.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::PathError;
use crate::domain::Workspace;
use crate::settings::Settings;

/// Environment variable overriding the data root.
const DATA_DIR_ENV: &str = "TFBRIDGE_DATA_DIR";

/// Root directory for tfbridge data and config.
///
/// Resolution order:
/// 1. `TFBRIDGE_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/tfbridge`)
///
/// The directory is created if missing.
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = match env::var(DATA_DIR_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => dirs::data_local_dir()
            .ok_or(PathError::NoDataDir)?
            .join("tfbridge"),
    };

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
    }

    Ok(root)
}

/// Location of the `.env` file read at CLI startup.
pub fn env_file_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(".env"))
}

/// Default location of the settings file.
pub fn settings_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("settings.json"))
}

/// Default location of the workspace registry file.
pub fn workspaces_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("workspaces.json"))
}

/// Load settings from `path`. A missing file yields defaults.
pub fn load_settings(path: &Path) -> Result<Settings, PathError> {
    Ok(read_json(path)?.unwrap_or_else(Settings::with_defaults))
}

/// Write settings to `path`, creating parent directories.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), PathError> {
    write_json(path, settings)
}

/// Load the workspace list from `path`. A missing file yields no workspaces.
pub fn load_workspaces(path: &Path) -> Result<Vec<Workspace>, PathError> {
    Ok(read_json(path)?.unwrap_or_default())
}

/// Write the workspace list to `path`, creating parent directories.
pub fn save_workspaces(path: &Path, workspaces: &[Workspace]) -> Result<(), PathError> {
    write_json(path, workspaces)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PathError> {
    if !path.exists() {
        debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(None);
    }

    let text = fs::read_to_string(path).map_err(|e| PathError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| PathError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PathError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PathError::CreateFailed {
            path: parent.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    let text = serde_json::to_string_pretty(value).map_err(|e| PathError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, text).map_err(|e| PathError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Mapping;
    use tempfile::tempdir;

    #[test]
    fn test_missing_settings_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::with_defaults());
    }

    #[test]
    fn test_settings_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::with_defaults();
        settings.collection_url = Some("https://dev.azure.com/org".into());
        save_settings(&path, &settings).unwrap();

        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_malformed_settings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_settings(&path), Err(PathError::Malformed { .. })));
    }

    #[test]
    fn test_workspaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("workspaces.json");
        assert!(load_workspaces(&path).unwrap().is_empty());

        let ws = Workspace::new("ws1").with_mapping(Mapping::new("$/Proj", "/src/proj"));
        save_workspaces(&path, std::slice::from_ref(&ws)).unwrap();

        let loaded = load_workspaces(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "ws1");
        assert_eq!(loaded[0].mappings.len(), 1);
    }
}
