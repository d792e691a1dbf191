//! Error taxonomy surfaced by refresh and login operations.
//!
//! Local reads never produce these; only operations that reach the network
//! (and the write that follows them) do. Cancellation is not an error: a
//! dropped future simply stops, and nothing here wraps it.

use thiserror::Error;

/// Failure reported to callers of refresh/login operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Transport or I/O failure before a response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("HTTP {code}: {message}")]
    Http { code: u16, message: String },

    /// Anything else, including malformed payloads
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl CatalogError {
    pub fn unknown(message: impl Into<String>) -> Self {
        CatalogError::Unknown(message.into())
    }

    /// HTTP status code when the server rejected the request.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CatalogError::Http { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() || err.is_decode() {
            return CatalogError::Unknown(err.to_string());
        }
        if let Some(status) = err.status() {
            return CatalogError::Http {
                code: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_string(),
            };
        }
        if err.is_timeout()
            || err.is_connect()
            || err.is_request()
            || err.is_body()
        {
            return CatalogError::Network(err.to_string());
        }
        CatalogError::Unknown(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Unknown(format!("Malformed response: {err}"))
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Network(err.to_string())
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(sqlx::Error::Io(io)) => {
                CatalogError::Network(io.to_string())
            }
            other => CatalogError::Unknown(other.to_string()),
        }
    }
}

/// Failures inside the local catalog store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Failed to prepare store directory")]
    Directory(#[source] std::io::Error),
}

/// Result type alias for refresh and login operations
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_failures_in_the_store_count_as_network_errors() {
        let err = StoreError::Database(sqlx::Error::Io(std::io::Error::other(
            "disk unplugged",
        )));
        assert!(matches!(CatalogError::from(err), CatalogError::Network(_)));
    }

    #[test]
    fn other_store_failures_are_unknown() {
        let err = StoreError::Database(sqlx::Error::RowNotFound);
        assert!(matches!(CatalogError::from(err), CatalogError::Unknown(_)));
    }

    #[test]
    fn malformed_json_is_unknown() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(CatalogError::from(err), CatalogError::Unknown(_)));
    }

    #[test]
    fn http_errors_expose_their_status() {
        let err = CatalogError::Http {
            code: 401,
            message: "Unauthorized".into(),
        };
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(CatalogError::unknown("x").status_code(), None);
    }
}
