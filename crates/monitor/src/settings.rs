//! Monitor settings

use crate::MonitorError;
use crate::replay::ReplayOptions;
use posture::PostureConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Environment variable prefix, nested keys separated by `__`
pub const ENV_PREFIX: &str = "POSTURE";

/// Settings for the replay monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Detector configuration
    pub posture: PostureConfig,
    /// JSON-lines landmark recording, stdin when unset
    pub frames_path: Option<PathBuf>,
    /// Processed frames per second
    pub camera_fps: u32,
    /// Sleep between frames to replay at recorded speed
    pub realtime: bool,
    /// Run a calibration at the start of the recording
    pub calibrate_on_start: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            posture: PostureConfig::default(),
            frames_path: None,
            camera_fps: 2,
            realtime: false,
            calibrate_on_start: false,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl MonitorSettings {
    /// Load settings from an optional TOML file, then `POSTURE__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    /// Like [`MonitorSettings::load`] with a custom variable prefix.
    ///
    /// Nested keys take one more separator: `<PREFIX>__POSTURE__THRESHOLD_PERCENTAGE`.
    pub fn load_with_env_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, MonitorError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let settings: MonitorSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.camera_fps == 0 {
            return Err(MonitorError::InvalidSettings(
                "camera_fps must be greater than zero".into(),
            ));
        }
        self.log_level()?;
        self.posture.validate()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_level(&self) -> Result<Level, MonitorError> {
        self.log_level.parse::<Level>().map_err(|_| {
            MonitorError::InvalidSettings(format!("unknown log_level {:?}", self.log_level))
        })
    }

    /// Spacing of frames that carry no timestamp
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.camera_fps.max(1)))
    }

    pub fn replay_options(&self) -> ReplayOptions {
        ReplayOptions {
            frame_interval: self.frame_interval(),
            realtime: self.realtime,
            calibrate_on_start: self.calibrate_on_start,
        }
    }
}
