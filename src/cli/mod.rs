//! Command-line interface components
//!
//! This module contains CLI-specific code for the Card Package Manager:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, CompileArgs, DownloadArgs, GlobalArgs, InfoArgs, SearchArgs, UpdateArgs,
    UploadArgs,
};
pub use commands::{
    handle_compile, handle_debug, handle_download, handle_info, handle_search, handle_update,
    handle_upload,
};
