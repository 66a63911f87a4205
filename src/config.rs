// src/config.rs - TOML configuration for the tour process

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Process configuration: where the PTZ daemon lives and how the tour path
/// is built. The device-side parameter store (e.g. `MaxPanTiltSpeed`) is
/// read at runtime and is not part of this file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub tour: TourConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_video_channel")]
    pub video_channel: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            video_channel: default_video_channel(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TourConfig {
    /// Points inserted between consecutive preset stops.
    #[serde(default = "default_interpolation_count")]
    pub interpolation_count: usize,
    /// Speed used when recalling a preset while sampling the path.
    #[serde(default = "default_goto_speed")]
    pub goto_speed: f32,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            interpolation_count: default_interpolation_count(),
            goto_speed: default_goto_speed(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    9350
}
fn default_video_channel() -> u32 {
    1
}
fn default_interpolation_count() -> usize {
    2
}
fn default_goto_speed() -> f32 {
    0.4
}

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("ptztour.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "[camera]\nhost = \"10.0.0.90\"\n\n[tour]\ninterpolation_count = 4"
        )
        .unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.camera.host, "10.0.0.90");
        assert_eq!(config.tour.interpolation_count, 4);
        // Defaults for missing fields
        assert_eq!(config.camera.port, 9350);
        assert_eq!(config.camera.video_channel, 1);
        assert_eq!(config.tour.goto_speed, 0.4);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.camera.host, "127.0.0.1");
        assert_eq!(config.tour.interpolation_count, 2);
    }
}
