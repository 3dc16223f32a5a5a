//! Watermark state store trait definition.

use async_trait::async_trait;

use crate::errors::StateStoreError;
use crate::types::Watermarks;

/// Durable key to timestamp map holding the sync watermarks.
///
/// There is a single writer, so implementations need no locking, but `save`
/// must be atomic: a crash mid-write leaves the previous state intact.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Load the persisted watermarks. A store that was never written loads as empty.
    async fn load(&self) -> Result<Watermarks, StateStoreError>;

    /// Replace the persisted watermarks.
    async fn save(&self, watermarks: &Watermarks) -> Result<(), StateStoreError>;
}
