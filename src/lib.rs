//! Card Package Manager Library
//!
//! A Rust library for the card package catalog: browse and publish package
//! metadata, download packages together with their dependencies, and compile
//! their lorebooks into a single document.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
