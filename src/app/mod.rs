//! Core application logic for the Card Package Manager
//!
//! This module contains the catalog client, the item data models, item data
//! entry, and the package download and compile pipeline.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cpm::app::{compile_bundle, CatalogClient, ClientConfig, Downloader, PackageBundle};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CatalogClient::connect(ClientConfig::default()).await?;
//!
//! let mut bundle = PackageBundle::new();
//! Downloader::new(&client, ".")
//!     .download_many("remilia,sakuya", &mut bundle)
//!     .await?;
//!
//! let lorebook = compile_bundle(&bundle, "remilia")?;
//! println!("{} entries", lorebook["entries"].as_array().map_or(0, Vec::len));
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod client;
pub mod compile;
pub mod input;
pub mod models;
pub mod package;

// Re-export main public API
pub use archive::package_files;
pub use client::{build_list_url, CatalogClient, ClientConfig};
pub use compile::{compile_bundle, compile_lorebook, write_lorebook};
pub use input::{collect_item_data, load_item_file, normalize, prompt_item_data};
pub use models::{Item, ItemPayload, ItemSummary};
pub use package::{parse_names, Downloader, PackageBundle};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Ensure public API is accessible
        let config = ClientConfig::default();
        assert!(config.schema_check);
        assert!(PackageBundle::new().is_empty());
    }
}
