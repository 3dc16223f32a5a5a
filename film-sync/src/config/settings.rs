//! Environment-driven settings.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::ServiceError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default watermark state file.
const DEFAULT_STATE_FILE: &str = "var/etl_state.json";

/// How long a query waits for a pooled connection.
const DATABASE_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub url: String,
    pub timeout: Duration,
    pub movies_index: String,
    pub persons_index: String,
    pub genres_index: String,
    pub create_missing_indexes: bool,
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub state_file: PathBuf,
    pub interval: Duration,
    pub extract_batch_size: usize,
    pub index_batch_size: usize,
    /// Also keep the flat `persons` and `genres` indexes in sync.
    pub directory_indexes: bool,
    pub max_iterations: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub debug: bool,
    pub format: LogFormat,
}

/// Everything the process reads from its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub search: SearchSettings,
    pub sync: SyncSettings,
    pub retry: RetryPolicy,
    pub log: LogSettings,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: Postgres DSN (required)
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size, at least 2 (default: 4)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_TIMEOUT_SECS`: Per-request timeout (default: 30)
    /// - `MOVIES_INDEX` / `PERSONS_INDEX` / `GENRES_INDEX`: Index names
    /// - `SYNC_DIRECTORY_INDEXES`: Sync the persons and genres indexes (default: false)
    /// - `CREATE_MISSING_INDEXES`: Create missing indexes at startup (default: false)
    /// - `STATE_FILE`: Watermark file (default: var/etl_state.json)
    /// - `SYNC_INTERVAL_SECS`: Sleep between iterations (default: 10)
    /// - `EXTRACT_BATCH_SIZE` / `INDEX_BATCH_SIZE`: Page and bulk sizes (default: 500 / 1000)
    /// - `RETRY_MAX_ATTEMPTS`, `RETRY_INITIAL_DELAY_MS`, `RETRY_MAX_DELAY_SECS`: Backoff
    /// - `MAX_ITERATIONS`: Stop after this many iterations (default: unset)
    /// - `DEBUG`: Verbose logging (default: false)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServiceError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| ServiceError::config("DATABASE_URL must be set"))?;
        let max_connections: u32 = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 4)?;
        if max_connections < 2 {
            return Err(ServiceError::config(
                "DATABASE_MAX_CONNECTIONS must be at least 2",
            ));
        }

        let extract_batch_size = parse_or(&get, "EXTRACT_BATCH_SIZE", 500usize)?;
        let index_batch_size = parse_or(&get, "INDEX_BATCH_SIZE", 1000usize)?;
        if extract_batch_size == 0 || index_batch_size == 0 {
            return Err(ServiceError::config("Batch sizes must be greater than zero"));
        }

        let format = match get("LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ServiceError::config(format!(
                    "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            database: DatabaseSettings {
                url: database_url,
                max_connections,
                acquire_timeout: DATABASE_ACQUIRE_TIMEOUT,
            },
            search: SearchSettings {
                url: get("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
                timeout: Duration::from_secs(parse_or(&get, "OPENSEARCH_TIMEOUT_SECS", 30)?),
                movies_index: get("MOVIES_INDEX").unwrap_or_else(|| "movies".to_string()),
                persons_index: get("PERSONS_INDEX").unwrap_or_else(|| "persons".to_string()),
                genres_index: get("GENRES_INDEX").unwrap_or_else(|| "genres".to_string()),
                create_missing_indexes: parse_bool(&get, "CREATE_MISSING_INDEXES")?,
            },
            sync: SyncSettings {
                state_file: get("STATE_FILE")
                    .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string())
                    .into(),
                interval: Duration::from_secs(parse_or(&get, "SYNC_INTERVAL_SECS", 10)?),
                extract_batch_size,
                index_batch_size,
                directory_indexes: parse_bool(&get, "SYNC_DIRECTORY_INDEXES")?,
                max_iterations: parse_opt(&get, "MAX_ITERATIONS")?,
            },
            retry: RetryPolicy {
                max_retries: parse_or(&get, "RETRY_MAX_ATTEMPTS", 5)?,
                initial_delay: Duration::from_millis(parse_or(&get, "RETRY_INITIAL_DELAY_MS", 100)?),
                max_delay: Duration::from_secs(parse_or(&get, "RETRY_MAX_DELAY_SECS", 10)?),
            },
            log: LogSettings {
                debug: parse_bool(&get, "DEBUG")?,
                format,
            },
        })
    }
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ServiceError>
where
    T: FromStr,
    T::Err: Display,
{
    get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                ServiceError::config(format!("Invalid value '{}' for {}: {}", raw, key, e))
            })
        })
        .transpose()
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ServiceError>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_bool(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, ServiceError> {
    match get(key).map(|v| v.trim().to_lowercase()).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(ServiceError::config(format!(
            "Invalid boolean '{}' for {}",
            other, key
        ))),
    }
}
