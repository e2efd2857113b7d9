//! Application constants for the Card Package Manager
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Switches to the local catalog, skips the schema check and raises verbosity
    pub const DEBUG: &str = "CPM_DEBUG";

    /// Overrides the catalog URL
    pub const URL: &str = "CPM_URL";

    /// Overrides the directory holding the token, logs and debug dumps
    pub const DATA_DIR: &str = "CPM_DATA_DIR";
}

/// Catalog endpoints
pub mod catalog {
    /// Production catalog root
    pub const PRODUCTION_URL: &str = "https://moistcat.pythonanywhere.com/";

    /// Local development catalog root, used in debug mode
    pub const DEBUG_URL: &str = "http://localhost:5050/";

    /// Documentation path relative to the catalog root
    pub const DOCS_PATH: &str = "docs";

    /// Number of items the server returns per listing page
    pub const PAGE_SIZE: usize = 10;
}

/// Item schema shared with the server
pub mod schema {
    /// Fields accepted by the catalog for an item. `id` is server-internal.
    pub const ITEM_FIELDS: [&str; 9] = [
        "name",
        "deps",
        "tags",
        "image",
        "desc",
        "file",
        "service",
        "date_created",
        "date_updated",
    ];

    /// Server-internal identifier, stripped before comparing and updating
    pub const ID_FIELD: &str = "id";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// User agent sent with every request
    pub const USER_AGENT: &str = concat!("cpm/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Bytes of a failing response body quoted in the error log
    pub const ERROR_BODY_PREVIEW: usize = 50;
}

/// Retry configuration
pub mod limits {
    /// Retries after the first attempt on connection-layer failures
    pub const MAX_RETRIES: u32 = 3;

    /// Fixed delay between retries (milliseconds)
    pub const RETRY_DELAY_MS: u64 = 1000;
}

/// File names and extensions
pub mod files {
    /// Application directory name under the platform data/config dirs
    pub const APP_DIR: &str = "cpm";

    /// Persisted auth token
    pub const TOKEN_FILE: &str = "token.key";

    /// Default log directory under the data directory
    pub const LOG_DIR: &str = "logs";

    /// Audit log file prefix
    pub const AUDIT_LOG: &str = "client.audit";

    /// Error log file prefix
    pub const ERROR_LOG: &str = "client.error";

    /// Raw body of the last failing HTTP response
    pub const DEBUG_DUMP: &str = "debug.html";

    /// Project-local configuration file
    pub const LOCAL_CONFIG: &str = "cpm.toml";

    /// Configuration file name under the user config directory
    pub const CONFIG_FILE: &str = "config.toml";

    /// Item metadata sidecar extension
    pub const METADATA_EXT: &str = "json";

    /// Lorebook payload extension
    pub const LOREBOOK_EXT: &str = "lorebook";

    /// Package archive extension
    pub const ARCHIVE_EXT: &str = "zip";

    /// Image extension used when the URL carries none
    pub const FALLBACK_IMAGE_EXT: &str = "bin";

    /// Default output of the compile command
    pub const DEFAULT_COMPILED: &str = "compiled.lorebook";
}

/// Logging constants
pub mod logging {
    /// Target of the audit channel (complete record, file)
    pub const AUDIT_TARGET: &str = "cpm::audit";

    /// Target of the user-facing channel (console)
    pub const USER_TARGET: &str = "cpm::user";

    /// Target of the error channel (error file)
    pub const ERROR_TARGET: &str = "cpm::error";

    /// Rotated log files kept per channel
    pub const MAX_LOG_FILES: usize = 2;

    /// Bytes of the audit log shown by `cpm debug` (~200 entries)
    pub const DEBUG_TAIL_BYTES: u64 = 50 * 200;
}

// Re-export commonly used constants for convenience
pub use catalog::{DEBUG_URL, PAGE_SIZE, PRODUCTION_URL};
pub use env::{DEBUG as ENV_DEBUG, URL as ENV_URL};
pub use http::USER_AGENT;
pub use limits::{MAX_RETRIES, RETRY_DELAY_MS};
pub use schema::ITEM_FIELDS;
