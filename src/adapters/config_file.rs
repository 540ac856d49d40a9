//! JSON config file adapter.
//!
//! Implements [`ConfigPort`] by reading `config.json` through the VFS.
//! On device the file lives on a SPIFFS partition mounted at
//! [`SPIFFS_BASE`]; on host any path works.

use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use log::{error, info};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

/// VFS mount point of the storage partition.
pub const SPIFFS_BASE: &str = "/spiffs";

/// Default location of the device config.
pub const DEFAULT_PATH: &str = "/spiffs/config.json";

pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Mount the default SPIFFS partition and point at [`DEFAULT_PATH`].
    #[cfg(target_os = "espidf")]
    pub fn mount_spiffs() -> Result<Self, ConfigError> {
        use esp_idf_svc::sys::{esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register, ESP_OK};

        let conf = esp_vfs_spiffs_conf_t {
            base_path: c"/spiffs".as_ptr(),
            partition_label: core::ptr::null(),
            max_files: 4,
            format_if_mount_failed: false,
        };
        // SAFETY: `conf` outlives the call; the base path is a static C string.
        let rc = unsafe { esp_vfs_spiffs_register(&conf) };
        if rc != ESP_OK as i32 {
            error!("Config: SPIFFS mount failed ({})", rc);
            return Err(ConfigError::IoError);
        }
        info!("Config: SPIFFS mounted at {}", SPIFFS_BASE);
        Ok(Self::new(DEFAULT_PATH))
    }
}

impl ConfigPort for ConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            error!("Config: cannot read {}: {}", self.path.display(), e);
            match e.kind() {
                IoErrorKind::NotFound => ConfigError::NotFound,
                _ => ConfigError::IoError,
            }
        })?;
        let cfg = SystemConfig::from_json(&text)?;
        info!(
            "Config: loaded {} (interval {} s, calibration {} s)",
            self.path.display(),
            cfg.measurement_interval_secs,
            cfg.calibration_duration_secs
        );
        Ok(cfg)
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    fn scratch(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("firewatch-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_is_not_found() {
        let file = ConfigFile::new("/nonexistent/firewatch/config.json");
        assert_eq!(file.load(), Err(ConfigError::NotFound));
    }

    #[test]
    fn loads_the_shipped_example() {
        let text = include_str!("../../config.example.json");
        let path = scratch("example", text);
        let cfg = ConfigFile::new(&path).load().unwrap();
        assert_eq!(cfg.pins.smoke_sensor, 4);
        assert_eq!(cfg.mqtt.topic("cmd").as_str(), "firewatch/kitchen/cmd");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn syntax_error_reports_position() {
        let path = scratch("broken", "{\n  \"WIFI\": ,\n}");
        let err = ConfigFile::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 2, .. }), "{:?}", err);
        std::fs::remove_file(path).unwrap();
    }
}
