//! Launcher configuration

use achievements::ConflictPolicy;
use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for the achievement side of the launcher.
///
/// Every field has a default, so a partial (or empty) JSON object is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LauncherConfig {
    /// Directory holding the achievement save
    pub data_dir: PathBuf,
    /// Offset from UTC, in minutes, used for play-time windows and streak days
    pub utc_offset_minutes: i32,
    /// Policy used when importing custom achievements without an explicit one
    pub import_policy: ConflictPolicy,
    /// Persist after every evaluation that changed unlock state or progress
    pub save_on_change: bool,
    /// Number of notifications kept for the UI
    pub notification_history: usize,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            utc_offset_minutes: 0,
            import_policy: ConflictPolicy::Skip,
            save_on_change: true,
            notification_history: 50,
        }
    }
}

impl LauncherConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file, or use defaults when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).with_context(|| {
            format!("UTC offset out of range: {} minutes", self.utc_offset_minutes)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("launcher.json");
        std::fs::write(&path, r#"{"utcOffsetMinutes": 120, "importPolicy": "overwrite"}"#).unwrap();

        let config = LauncherConfig::load(&path).unwrap();

        assert_eq!(config.utc_offset_minutes, 120);
        assert_eq!(config.import_policy, ConflictPolicy::Overwrite);
        assert!(config.save_on_change);
        assert_eq!(config.utc_offset().unwrap(), FixedOffset::east_opt(7200).unwrap());
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("launcher.json");
        std::fs::write(&path, r#"{"utcOffsetMinutes": 2000}"#).unwrap();

        assert!(LauncherConfig::load(&path).is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = LauncherConfig::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, LauncherConfig::default());
    }
}
