use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to access \"{}\"", .0.display())]
    Inaccessible(PathBuf),
}

/// User-facing properties of the DVD playback kit.
///
/// The firmware path is exposed as `file`. Setting it through [`Self::set_firmware_path`] checks
/// that the path exists; values loaded through serde are only checked when the device is
/// realized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DvdPlaybackKitConfig {
    #[serde(default, rename = "file", skip_serializing_if = "Option::is_none")]
    firmware: Option<PathBuf>,
}

impl DvdPlaybackKitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_firmware_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        config.set_firmware_path(path)?;
        Ok(config)
    }

    pub fn firmware_path(&self) -> Option<&Path> {
        self.firmware.as_deref()
    }

    /// Sets the `file` property. A path that does not exist is rejected and the previous value
    /// is kept.
    pub fn set_firmware_path(&mut self, path: impl Into<PathBuf>) -> Result<(), ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Err(ConfigError::Inaccessible(path));
        }
        self.firmware = Some(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_path_keeps_previous_value() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = DvdPlaybackKitConfig::with_firmware_path(file.path()).unwrap();

        let missing = file.path().with_extension("missing");
        let err = config.set_firmware_path(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Inaccessible(ref p) if p == &missing));
        assert_eq!(config.firmware_path(), Some(file.path()));
    }

    #[test]
    fn file_property_name_is_used_on_the_wire() {
        let config: DvdPlaybackKitConfig =
            serde_json::from_str(r#"{ "file": "/nonexistent/dvd.bin" }"#).unwrap();
        assert_eq!(config.firmware_path(), Some(Path::new("/nonexistent/dvd.bin")));

        let empty: DvdPlaybackKitConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, DvdPlaybackKitConfig::default());
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
    }
}
