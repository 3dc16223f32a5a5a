//! In-memory watermark state for one sync process.
//!
//! The orchestrator owns the only `PipelineState`: it builds one from the
//! persisted watermarks at startup, hands a working copy to each iteration and
//! keeps it only when the iteration and the save both succeeded.

use chrono::{DateTime, Utc};
use film_sync_repository::Watermarks;
use film_sync_shared::{min_watermark, WatermarkKey};
use tracing::{debug, warn};

/// Watermarks the pipelines compare against and advance.
///
/// Timestamp keys this process does not know about are carried through
/// untouched, so a state file written by a newer build is not truncated on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineState {
    watermarks: Watermarks,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_watermarks(watermarks: Watermarks) -> Self {
        Self { watermarks }
    }

    /// Current watermark for `key`, or the minimum timestamp when it was never set.
    pub fn watermark(&self, key: WatermarkKey) -> DateTime<Utc> {
        self.watermarks
            .get(key.as_str())
            .copied()
            .unwrap_or_else(min_watermark)
    }

    /// Move `key` forward to `to`.
    ///
    /// Watermarks never decrease: a value older than the current one is ignored
    /// with a warning. Returns whether the watermark moved.
    pub fn advance(&mut self, key: WatermarkKey, to: DateTime<Utc>) -> bool {
        let current = self.watermark(key);
        if to < current {
            warn!(
                key = %key,
                current = %current,
                proposed = %to,
                "Ignoring watermark regression"
            );
            return false;
        }
        if to == current && self.watermarks.contains_key(key.as_str()) {
            return false;
        }

        debug!(key = %key, from = %current, to = %to, "Advancing watermark");
        self.watermarks.insert(key.as_str().to_string(), to);
        true
    }

    pub fn watermarks(&self) -> &Watermarks {
        &self.watermarks
    }
}

/// Counters for one pipeline run or one whole iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationStats {
    /// Change rows read from the source.
    pub rows_extracted: usize,
    /// Documents the index accepted.
    pub documents_loaded: usize,
    /// Batches whose watermark was advanced.
    pub batches: usize,
}

impl IterationStats {
    pub fn merge(&mut self, other: IterationStats) {
        self.rows_extracted += other.rows_extracted;
        self.documents_loaded += other.documents_loaded;
        self.batches += other.batches;
    }
}
