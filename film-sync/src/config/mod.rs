//! Configuration and dependency initialization.

mod dependencies;
mod settings;

pub use dependencies::{build_pipelines, Dependencies};
pub use settings::{DatabaseSettings, LogFormat, LogSettings, SearchSettings, Settings, SyncSettings};
