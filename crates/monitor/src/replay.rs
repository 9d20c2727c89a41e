//! Replay of recorded landmark frames

use crate::MonitorError;
use pose_landmarks::{Landmark, PoseLandmarks, MIN_SHOULDER_VISIBILITY};
use posture::{PostureReading, SlouchDetector};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// One recorded frame, as a JSON line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Milliseconds since the start of the recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_ms: Option<u64>,
    /// Detected pose, absent when nobody was in frame
    #[serde(default)]
    pub landmarks: Option<Vec<Landmark>>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    /// Spacing of frames without a timestamp
    pub frame_interval: Duration,
    /// Pace frames at their recorded times
    pub realtime: bool,
    pub calibrate_on_start: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(500),
            realtime: false,
            calibrate_on_start: false,
        }
    }
}

/// Totals for one replay
#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub frames: usize,
    pub frames_with_pose: usize,
    /// Frames with a pose whose shoulders were barely visible
    pub shoulders_hidden: usize,
    /// Lines that were not valid frame records
    pub skipped_lines: usize,
    pub calibrations_completed: usize,
    pub slouching_frames: usize,
    /// Separate stretches of slouching
    pub slouch_episodes: usize,
    pub last_reading: Option<PostureReading>,
}

/// Feed every frame of `reader` through `detector`
pub async fn replay<R>(
    detector: &mut SlouchDetector,
    reader: R,
    options: &ReplayOptions,
) -> Result<ReplaySummary, MonitorError>
where
    R: AsyncBufRead + Unpin,
{
    let start = Instant::now();
    let mut summary = ReplaySummary::default();
    let mut was_slouching = false;

    if options.calibrate_on_start {
        detector.start_calibration(start);
    }

    let mut lines = reader.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: FrameRecord = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping line {}: {}", line_no, e);
                summary.skipped_lines += 1;
                continue;
            }
        };

        let offset = record
            .t_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| options.frame_interval * summary.frames as u32);
        let now = start + offset;
        if options.realtime {
            tokio::time::sleep_until(tokio::time::Instant::from_std(now)).await;
        }

        let pose = record.landmarks.map(PoseLandmarks::new);
        if let Some(pose) = &pose {
            if !pose.shoulders_visible(MIN_SHOULDER_VISIBILITY) {
                debug!("Shoulders not clearly visible at {:.1}s", offset.as_secs_f64());
                summary.shoulders_hidden += 1;
            }
        }
        let reading = detector.process_frame(pose.as_ref(), now);

        summary.frames += 1;
        if reading.pose_detected {
            summary.frames_with_pose += 1;
        }
        if reading.calibration_completed {
            summary.calibrations_completed += 1;
            info!("Calibration complete at {:.1}s", offset.as_secs_f64());
        }

        let slouching = reading.is_slouching();
        if slouching {
            summary.slouching_frames += 1;
            if !was_slouching {
                summary.slouch_episodes += 1;
                info!(
                    "Slouching detected at {:.1}s: {:.0}%",
                    offset.as_secs_f64(),
                    reading.slouch_percentage().unwrap_or_default()
                );
            }
        } else if was_slouching {
            info!("Posture recovered at {:.1}s", offset.as_secs_f64());
        }
        was_slouching = slouching;

        debug!("{:.1}s {}", offset.as_secs_f64(), reading.summary());
        summary.last_reading = Some(reading);
    }

    Ok(summary)
}
