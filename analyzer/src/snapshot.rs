//! Whole-state persistence as a single versioned JSON file.
//!
//! Writes are whole-file and not transactional; a crash mid-write can leave a corrupt file, which
//! surfaces as [`SnapshotError::Format`] on the next load.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregator::{AnalysisState, RepoRecord};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("could not access snapshot file [{path}]; nested = {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot file [{path}] is malformed; nested = {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Serialized form of an [`AnalysisState`]. The explicit version field guards against reading a
/// file written by an incompatible build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub repos: BTreeMap<String, RepoRecord>,
    pub failures: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn from_state(state: &AnalysisState) -> Self {
        Snapshot {
            version: SNAPSHOT_VERSION,
            repos: state.repos.clone(),
            failures: state.failures.clone(),
        }
    }

    pub fn into_state(self) -> Result<AnalysisState, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(AnalysisState {
            repos: self.repos,
            failures: self.failures,
        })
    }

    pub fn write_to(&self, path: &Path) -> Result<(), SnapshotError> {
        let body = serde_json::to_string_pretty(self).map_err(|source| SnapshotError::Format {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(path, body).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn read_from(path: &Path) -> Result<Self, SnapshotError> {
        let body = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| SnapshotError::Format {
            path: path.display().to_string(),
            source,
        })
    }
}
