//! JSON file implementation of the watermark store.
//!
//! The state file is a flat object of key to ISO-8601 timestamp:
//!
//! ```json
//! { "fw_date": "2024-05-01T10:00:00Z", "g_date": "2024-04-30T08:12:44Z", "p_date": "2024-05-01T09:58:02Z" }
//! ```
//!
//! Entries whose value is not a timestamp (such as a `data_count` counter) are
//! skipped on load and are not written back.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::StateStoreError;
use crate::interfaces::WatermarkStore;
use crate::types::Watermarks;

/// Watermark store persisted as a JSON file.
///
/// Writes go to a sibling temp file which is synced and then renamed over the
/// state file, so a crash mid-write never leaves a truncated state behind.
pub struct JsonFileWatermarkStore {
    path: PathBuf,
}

impl JsonFileWatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl WatermarkStore for JsonFileWatermarkStore {
    async fn load(&self) -> Result<Watermarks, StateStoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "State file not found, starting from scratch");
                return Ok(Watermarks::new());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Watermarks::new());
        }

        let raw: BTreeMap<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|e| StateStoreError::format(format!("{}: {}", self.path.display(), e)))?;

        let mut watermarks = Watermarks::new();
        for (key, value) in raw {
            // null values are treated like absent keys
            if value.is_null() {
                continue;
            }
            match serde_json::from_value::<DateTime<Utc>>(value) {
                Ok(ts) => {
                    watermarks.insert(key, ts);
                }
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        key = %key,
                        error = %e,
                        "Ignoring state entry that is not a timestamp"
                    );
                }
            }
        }

        Ok(watermarks)
    }

    async fn save(&self, watermarks: &Watermarks) -> Result<(), StateStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(watermarks)
            .map_err(|e| StateStoreError::format(e.to_string()))?;

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), keys = watermarks.len(), "State saved");
        Ok(())
    }
}
