use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Result, SessionParameters};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionParameters,
    /// "Get ready" countdown before the session clock starts.
    pub lead_in_secs: u32,
    pub tick_interval_ms: u64,
    pub audio: AudioConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionParameters::default(),
            lead_in_secs: 5,
            tick_interval_ms: 16,
            audio: AudioConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file. A missing file yields the defaults; a
    /// malformed one is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match fs::read(path) {
            Ok(bytes) => {
                let config: AppConfig = serde_json::from_slice(&bytes)?;
                tracing::debug!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub sample_rate: u32,
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 48_000,
            volume: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PacerError;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn roundtrip_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            session: SessionParameters {
                total_reps: 200,
                set_size: 20,
                ratio: 9.0,
            },
            lead_in_secs: 0,
            tick_interval_ms: 33,
            audio: AudioConfig {
                enabled: false,
                ..AudioConfig::default()
            },
        };

        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "lead_in_secs": 3, "audio": { "volume": 0.5 } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.lead_in_secs, 3);
        assert_eq!(config.audio.volume, 0.5);
        assert_eq!(config.audio.sample_rate, 48_000);
        assert_eq!(config.session, SessionParameters::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, PacerError::Config(_)));
    }
}
