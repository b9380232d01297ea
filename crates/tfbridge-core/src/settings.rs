//! Settings domain types and validation.
//!
//! Pure data with no infrastructure dependencies. Loading and saving lives in
//! [`crate::paths`].

use serde::{Deserialize, Serialize};

/// Default timeout for one command-line tool invocation.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 600;

/// Default REST API version sent with every request.
pub const DEFAULT_API_VERSION: &str = "3.0";

/// Application settings.
///
/// All fields are optional to support partial files and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Explicit path to the command-line tool. Falls back to `TF_CLI_PATH`,
    /// then a `PATH` search.
    pub tool_path: Option<String>,

    /// Default collection URL.
    pub collection_url: Option<String>,

    /// Default user name for the command-line tool.
    pub username: Option<String>,

    /// Make process completion wait until both output streams are drained.
    pub wait_for_output: Option<bool>,

    /// Per-command timeout in seconds (1-86400).
    pub command_timeout_secs: Option<u64>,

    /// JSON file listing known workspaces.
    pub workspaces_file: Option<String>,

    /// REST API version.
    pub api_version: Option<String>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            tool_path: None,
            collection_url: None,
            username: None,
            wait_for_output: Some(false),
            command_timeout_secs: Some(DEFAULT_COMMAND_TIMEOUT_SECS),
            workspaces_file: None,
            api_version: Some(DEFAULT_API_VERSION.to_string()),
        }
    }

    /// Effective command timeout (with default fallback).
    #[must_use]
    pub const fn effective_command_timeout_secs(&self) -> u64 {
        match self.command_timeout_secs {
            Some(secs) => secs,
            None => DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }

    /// Effective REST API version (with default fallback).
    #[must_use]
    pub fn effective_api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }

    /// Merge an update into this one, only touching fields that are `Some`.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref path) = other.tool_path {
            self.tool_path.clone_from(path);
        }
        if let Some(ref url) = other.collection_url {
            self.collection_url.clone_from(url);
        }
        if let Some(ref user) = other.username {
            self.username.clone_from(user);
        }
        if let Some(wait) = other.wait_for_output {
            self.wait_for_output = wait;
        }
        if let Some(secs) = other.command_timeout_secs {
            self.command_timeout_secs = secs;
        }
        if let Some(ref file) = other.workspaces_file {
            self.workspaces_file.clone_from(file);
        }
        if let Some(ref version) = other.api_version {
            self.api_version.clone_from(version);
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = clear the field
/// - `Some(Some(value))` = set the field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub tool_path: Option<Option<String>>,
    pub collection_url: Option<Option<String>>,
    pub username: Option<Option<String>>,
    pub wait_for_output: Option<Option<bool>>,
    pub command_timeout_secs: Option<Option<u64>>,
    pub workspaces_file: Option<Option<String>>,
    pub api_version: Option<Option<String>>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Command timeout must be between 1 and 86400 seconds, got {0}")]
    InvalidTimeout(u64),

    #[error("Collection URL must start with http:// or https://, got '{0}'")]
    InvalidCollectionUrl(String),

    #[error("Tool path cannot be empty")]
    EmptyToolPath,

    #[error("API version cannot be empty")]
    EmptyApiVersion,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(secs) = settings.command_timeout_secs {
        if !(1..=86_400).contains(&secs) {
            return Err(SettingsError::InvalidTimeout(secs));
        }
    }

    if let Some(ref url) = settings.collection_url {
        let lower = url.trim().to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(SettingsError::InvalidCollectionUrl(url.clone()));
        }
    }

    if settings
        .tool_path
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyToolPath);
    }

    if settings
        .api_version
        .as_ref()
        .is_some_and(|v| v.trim().is_empty())
    {
        return Err(SettingsError::EmptyApiVersion);
    }

    Ok(())
}
