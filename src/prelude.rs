//! Prelude module for the Card Package Manager library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use cpm::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cpm::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let client = CatalogClient::connect(config.client_config(None)?).await?;
//!
//!     let item = client.get_item("remilia").await?;
//!     println!("{}", item);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Catalog access
pub use crate::app::{CatalogClient, ClientConfig, Item, ItemPayload, ItemSummary};

// Package pipeline
pub use crate::app::{compile_bundle, Downloader, PackageBundle};

// Configuration and logging
pub use crate::config::AppConfig;
pub use crate::logging::{ChannelLogger, Verbosity};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _config = ClientConfig::default();
        let _bundle = PackageBundle::new();
        let _log = ChannelLogger::new("prelude");
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }
}
