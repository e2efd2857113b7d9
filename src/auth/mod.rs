//! Auth token management for the catalog
//!
//! The catalog identifies clients by an opaque UUID token. The token is
//! generated on first use, stored next to the logs, and sent with every request.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cpm::auth::load_or_create_token;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let token = load_or_create_token(std::path::Path::new("token.key"))?;
//! println!("Using token {}", token);
//! # Ok(())
//! # }
//! ```

pub mod token;

// Re-export main public API
pub use token::{generate_token, load_or_create_token};
