//! Error types for the Card Package Manager
//!
//! This module defines the error types for all components of the application.
//! Errors are designed to be actionable and provide clear context for debugging and
//! user feedback.

use std::path::PathBuf;
use thiserror::Error;

/// Auth token storage errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// File I/O error while reading or creating the token
    #[error("Failed to access token file {path}")]
    TokenStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Token file exists but holds no token
    #[error("Token file {path} is empty. Delete it to generate a new token")]
    EmptyToken { path: PathBuf },
}

/// Catalog HTTP client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection-layer failure that persisted through every retry
    #[error("Could not reach {url} after {attempts} attempts")]
    Network {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// Any other transport failure (timeouts, body decoding, client setup)
    #[error("HTTP request failed")]
    Transport(#[from] reqwest::Error),

    /// Auth token cannot be sent as a header value
    #[error("Auth token is not a valid header value")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    /// Server answered with an error status
    #[error("Server URL {url} failed with status code {status}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Server answered 404
    #[error("Not found: {url}")]
    NotFound { url: String },

    /// Local item schema differs from the server's
    #[error(
        "The item scheme has been updated. Upgrade the client accordingly (missing: {missing:?}, unexpected: {unexpected:?})"
    )]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Documentation endpoint did not contain a schema
    #[error("The item scheme has been updated. Upgrade the client accordingly ({reason})")]
    SchemaUnreadable { reason: String },

    /// Payload key outside the item schema
    #[error("Invalid field '{field}'. Accepted fields: name, deps, tags, image, desc, file, service")]
    InvalidField { field: String },

    /// Update response came back without tags
    #[error("Update of '{name}' was not applied by the server")]
    UpdateRejected { name: String },

    /// URL could not be parsed or joined
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Response body was not the expected JSON
    #[error("Unexpected response body")]
    Json(#[from] serde_json::Error),

    /// Debug dump could not be written
    #[error("File I/O error")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Download, packaging and compile errors
#[derive(Error, Debug)]
pub enum PackageError {
    /// Catalog request failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// File I/O error while writing package files
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Zip archive could not be written
    #[error("Failed to write archive {path}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Metadata sidecar could not be serialized
    #[error("Failed to serialize package metadata")]
    Json(#[from] serde_json::Error),

    /// A package needed for compilation has no payload
    #[error("Package '{name}' has no lorebook payload")]
    MissingPayload { name: String },

    /// A payload is not a usable lorebook
    #[error("Package '{package}' is not a valid lorebook: {reason}")]
    InvalidLorebook { package: String, reason: String },
}

/// Item data entry errors
#[derive(Error, Debug)]
pub enum InputError {
    /// Prompt or file I/O failed
    #[error("Failed to read item data")]
    Io(#[from] std::io::Error),

    /// YAML document could not be parsed
    #[error("Invalid YAML in {path}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML document is not a mapping
    #[error("Item file {path} must contain a mapping of fields")]
    NotAMapping { path: PathBuf },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No data directory could be determined
    #[error("Could not determine a data directory. Set CPM_DATA_DIR")]
    NoDataDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Auth token error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Catalog client error
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Download or compile error
    #[error(transparent)]
    Package(#[from] PackageError),

    /// Item data entry error
    #[error(transparent)]
    Input(#[from] InputError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Client(ClientError::Network { .. })
                | AppError::Package(PackageError::Client(ClientError::Network { .. }))
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Client(_) => "client",
            AppError::Package(_) => "package",
            AppError::Input(_) => "input",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Auth result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Client result type alias
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Package result type alias
pub type PackageResult<T> = std::result::Result<T, PackageError>;

/// Input result type alias
pub type InputResult<T> = std::result::Result<T, InputError>;

/// Config result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err = AppError::Client(ClientError::InvalidField {
            field: "id".to_string(),
        });
        assert_eq!(err.category(), "client");
        assert!(!err.is_recoverable());

        let err = AppError::generic("boom");
        assert_eq!(err.category(), "generic");
        assert_eq!(err.to_string(), "Application error: boom");
    }

    #[test]
    fn test_client_error_status() {
        let err = ClientError::Status {
            url: "http://localhost/x".to_string(),
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(500));

        let err = ClientError::NotFound {
            url: "http://localhost/x".to_string(),
        };
        assert_eq!(err.status(), Some(404));

        let err = ClientError::UpdateRejected {
            name: "remilia".to_string(),
        };
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_schema_mismatch_message_lists_keys() {
        let err = ClientError::SchemaMismatch {
            missing: vec!["service".to_string()],
            unexpected: vec!["rating".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("service"));
        assert!(message.contains("rating"));
    }
}
