use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::infrastructure::detector_factory::DetectorKind;
use crate::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use crate::shared::constants::{APP_DIR_NAME, DEFAULT_CAMERA_DEVICE};
use crate::steering::infrastructure::controller_factory::ControllerKind;
use crate::tracking::infrastructure::tracker_factory::TrackerKind;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("no platform config directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("malformed settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Persisted defaults. Command-line flags take precedence over these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detector: DetectorKind,
    pub model: Option<PathBuf>,
    pub confidence: f64,
    pub tracker: TrackerKind,
    /// `None` disables the steering readout.
    pub controller: Option<ControllerKind>,
    pub device: String,
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            detector: DetectorKind::Yolo,
            model: None,
            confidence: DEFAULT_CONFIDENCE,
            tracker: TrackerKind::Mosse,
            controller: None,
            device: DEFAULT_CAMERA_DEVICE.to_string(),
            snapshot_dir: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads from the platform config file, falling back to defaults when
    /// it is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings: {e}");
                Self::default()
            }
        }
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            detector: DetectorKind::Blazeface,
            model: Some(PathBuf::from("/models/blazeface.onnx")),
            confidence: 0.7,
            tracker: TrackerKind::Redetect,
            controller: Some(ControllerKind::Proportional),
            device: "/dev/video2".to_string(),
            snapshot_dir: Some(PathBuf::from("/tmp/shots")),
        };

        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "tracker": "redetect", "controller": "constant" }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.tracker, TrackerKind::Redetect);
        assert_eq!(settings.controller, Some(ControllerKind::Constant));
        assert_eq!(settings.detector, DetectorKind::Yolo);
        assert_eq!(settings.device, DEFAULT_CAMERA_DEVICE);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Settings::load_from(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn test_unknown_detector_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "detector": "haar" }"#).unwrap();

        assert!(Settings::load_from(&path).is_err());
    }
}
