//! Posture Monitor
//!
//! Drives the slouch detector from recorded landmark frames.

pub mod replay;
pub mod settings;

pub use replay::{replay, FrameRecord, ReplayOptions, ReplaySummary};
pub use settings::MonitorSettings;

use posture::{PostureError, SlouchDetector};
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Failed to load settings: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Posture(#[from] PostureError),

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read frames: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Initialize logging
pub fn init_logging(settings: &MonitorSettings) -> Result<(), MonitorError> {
    let level = settings.log_level()?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if settings.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| MonitorError::Logging(e.to_string()))
}

/// Replay the configured recording through a fresh detector
pub async fn run(settings: &MonitorSettings) -> Result<ReplaySummary, MonitorError> {
    let mut detector = SlouchDetector::new(settings.posture.clone())?;
    info!(
        "Slouch threshold {}%, baseline at {} ({})",
        detector.threshold(),
        detector.store().path().display(),
        if detector.is_calibrated() { "calibrated" } else { "not calibrated" }
    );

    let options = settings.replay_options();
    match &settings.frames_path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| MonitorError::Open {
                    path: path.clone(),
                    source,
                })?;
            replay(&mut detector, BufReader::new(file), &options).await
        }
        None => replay(&mut detector, BufReader::new(tokio::io::stdin()), &options).await,
    }
}
