//! Watermark keys for the sync state file.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `0001-01-01T00:00:00Z`, the earliest instant Postgres and the state file both accept.
const MIN_WATERMARK_SECS: i64 = -62_135_596_800;

/// The watermark assumed for a key that has never been persisted.
pub fn min_watermark() -> DateTime<Utc> {
    DateTime::from_timestamp(MIN_WATERMARK_SECS, 0).unwrap_or_default()
}

/// One watermark per change feed.
///
/// A watermark means "every row with `modified` up to this value has been
/// indexed". The string forms are the keys of the persisted state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WatermarkKey {
    /// Film works (`fw_date`).
    #[serde(rename = "fw_date")]
    Work,
    /// Persons, as a dependency of film works (`p_date`).
    #[serde(rename = "p_date")]
    Person,
    /// Genres, as a dependency of film works (`g_date`).
    #[serde(rename = "g_date")]
    Genre,
    /// Flat persons index (`persons_date`).
    #[serde(rename = "persons_date")]
    PersonDirectory,
    /// Flat genres index (`genres_date`).
    #[serde(rename = "genres_date")]
    GenreDirectory,
}

impl WatermarkKey {
    pub const ALL: [WatermarkKey; 5] = [
        WatermarkKey::Work,
        WatermarkKey::Person,
        WatermarkKey::Genre,
        WatermarkKey::PersonDirectory,
        WatermarkKey::GenreDirectory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatermarkKey::Work => "fw_date",
            WatermarkKey::Person => "p_date",
            WatermarkKey::Genre => "g_date",
            WatermarkKey::PersonDirectory => "persons_date",
            WatermarkKey::GenreDirectory => "genres_date",
        }
    }
}

impl fmt::Display for WatermarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatermarkKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WatermarkKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown watermark key: {}", s))
    }
}
