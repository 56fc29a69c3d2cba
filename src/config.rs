use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Settings sent by the client via `workspace/didChangeConfiguration`.
///
/// The client wraps everything under a `ycmd` key; a configuration without a
/// usable `ycmd.path` is rejected before it is stored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub ycmd: YcmdSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct YcmdSettings {
    /// Path to the ycmd executable.
    #[serde(default)]
    pub path: String,
    /// Raise ycmd's own log verbosity at spawn.
    #[serde(default)]
    pub debug: bool,
    /// Use the imprecise (no-recompile) variant of the type query for hover.
    #[serde(default)]
    pub use_imprecise_get_type: bool,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid ycmd path")]
    InvalidPath,

    #[error("Invalid configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl Settings {
    /// Parses and validates raw configuration JSON.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_value(value)?;
        if settings.ycmd.path.trim().is_empty() {
            return Err(SettingsError::InvalidPath);
        }
        Ok(settings)
    }
}

/// Returns the path to the data directory for ycmd-lsp.
/// Uses $XDG_DATA_HOME/ycmd-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/ycmd-lsp,
/// or ./ycmd-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("ycmd-lsp.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("ycmd-lsp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_accepts_complete_settings() {
        let settings = Settings::from_value(json!({
            "ycmd": {
                "path": "/opt/ycmd/ycmd",
                "debug": true,
                "use_imprecise_get_type": true
            }
        }))
        .unwrap();

        assert_eq!(settings.ycmd.path, "/opt/ycmd/ycmd");
        assert!(settings.ycmd.debug);
        assert!(settings.ycmd.use_imprecise_get_type);
    }

    #[test]
    fn from_value_defaults_optional_flags_to_false() {
        let settings = Settings::from_value(json!({"ycmd": {"path": "/opt/ycmd/ycmd"}})).unwrap();

        assert!(!settings.ycmd.debug);
        assert!(!settings.ycmd.use_imprecise_get_type);
    }

    #[test]
    fn from_value_rejects_missing_ycmd_section() {
        let result = Settings::from_value(json!({}));
        assert!(matches!(result, Err(SettingsError::Malformed(_))));
    }

    #[test]
    fn from_value_rejects_missing_path() {
        let result = Settings::from_value(json!({"ycmd": {}}));
        assert!(matches!(result, Err(SettingsError::InvalidPath)));
    }

    #[test]
    fn from_value_rejects_blank_path() {
        let result = Settings::from_value(json!({"ycmd": {"path": "   "}}));
        assert!(matches!(result, Err(SettingsError::InvalidPath)));
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/ycmd-lsp"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/ycmd-lsp"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./ycmd-lsp"));
    }
}
