//! File-backed baseline store

use crate::{LoadError, SaveError};
use chrono::{DateTime, Utc};
use pose_landmarks::Baseline;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current on-disk format version
pub const FORMAT_VERSION: u8 = 1;

/// What is written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub version: u8,
    /// When the calibration that produced the baseline completed
    pub calibrated_at: DateTime<Utc>,
    pub baseline: Baseline,
}

impl BaselineRecord {
    pub fn new(baseline: Baseline) -> Self {
        Self {
            version: FORMAT_VERSION,
            calibrated_at: Utc::now(),
            baseline,
        }
    }
}

/// Baseline persistence at a fixed path
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a baseline, replacing any previous one
    pub fn save(&self, baseline: &Baseline) -> Result<(), SaveError> {
        self.save_record(&BaselineRecord::new(*baseline))
    }

    pub fn save_record(&self, record: &BaselineRecord) -> Result<(), SaveError> {
        let bytes = postcard::to_allocvec(record).map_err(|e| SaveError::Encode(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SaveError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Write beside the target and rename so readers never see a partial file
        let tmp = self.tmp_path();
        fs::write(&tmp, &bytes).map_err(|source| SaveError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            SaveError::Io {
                path: self.path.clone(),
                source,
            }
        })?;

        info!("Calibration baseline saved to {}", self.path.display());
        Ok(())
    }

    /// Restore the stored baseline
    pub fn load(&self) -> Result<Baseline, LoadError> {
        self.load_record().map(|record| record.baseline)
    }

    pub fn load_record(&self) -> Result<BaselineRecord, LoadError> {
        let bytes = fs::read(&self.path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoadError::NotFound(self.path.clone()),
            _ => LoadError::Io {
                path: self.path.clone(),
                source,
            },
        })?;

        let record: BaselineRecord =
            postcard::from_bytes(&bytes).map_err(|e| LoadError::Corrupt(e.to_string()))?;

        if record.version != FORMAT_VERSION {
            return Err(LoadError::UnsupportedVersion(record.version));
        }
        if !record.baseline.is_finite() {
            return Err(LoadError::Invalid);
        }

        info!(
            "Calibration baseline loaded from {} (calibrated at {})",
            self.path.display(),
            record.calibrated_at
        );
        Ok(record)
    }

    /// Remove the stored baseline. A missing file is not an error.
    pub fn clear(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Calibration baseline removed from {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No baseline to remove at {}", self.path.display());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
