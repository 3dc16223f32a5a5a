//! File-backed implementations.

mod json_watermark_store;

pub use json_watermark_store::JsonFileWatermarkStore;
