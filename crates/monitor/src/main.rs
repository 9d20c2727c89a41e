//! Posture Monitor - Main Entry Point

use monitor::{init_logging, run, MonitorSettings};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("posture-monitor.toml"));

    let settings = MonitorSettings::load(Some(&config_path))?;
    init_logging(&settings)?;

    info!("=== Posture Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let summary = run(&settings).await?;
    info!(
        "Replayed {} frames ({} with a pose, {} skipped lines): {} calibrations, {} slouching frames in {} episodes",
        summary.frames,
        summary.frames_with_pose,
        summary.skipped_lines,
        summary.calibrations_completed,
        summary.slouching_frames,
        summary.slouch_episodes
    );
    if let Some(reading) = summary.last_reading {
        info!("Final state: {}", reading.summary());
        if reading.has_alerts() {
            info!("Active alerts: {:?}", reading.alerts);
        }
    }

    Ok(())
}
