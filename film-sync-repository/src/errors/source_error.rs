//! Relational source error types.

use thiserror::Error;

/// Errors from reading the relational catalog.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The connection dropped or could not be acquired.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The query itself failed.
    #[error("Query error: {0}")]
    Query(String),

    /// A row did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl SourceError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether retrying the same query may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::connection(err.to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. } => Self::decode(err.to_string()),
            sqlx::Error::Database(db_err) => {
                // Class 08 is connection exception, 57P covers server shutdown.
                let transient = db_err
                    .code()
                    .map(|code| code.starts_with("08") || code.starts_with("57P"))
                    .unwrap_or(false);
                if transient {
                    Self::connection(err.to_string())
                } else {
                    Self::query(err.to_string())
                }
            }
            _ => Self::query(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_error_classification() {
        assert!(SourceError::from(sqlx::Error::PoolTimedOut).is_transient());
        assert!(SourceError::from(sqlx::Error::PoolClosed).is_transient());
        assert!(matches!(
            SourceError::from(sqlx::Error::ColumnNotFound("title".to_string())),
            SourceError::Decode(_)
        ));
        assert!(!SourceError::from(sqlx::Error::RowNotFound).is_transient());
    }
}
