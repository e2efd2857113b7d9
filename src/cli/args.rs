//! Command-line argument parsing for the Card Package Manager
//!
//! This module defines the CLI structure using clap derive macros: catalog
//! browsing, item upload and update, package download and compile, and a
//! dump of the recent audit log.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::constants::files;
use crate::logging::Verbosity;

/// cpm - Card Package Manager
#[derive(Parser, Debug)]
#[command(
    name = "cpm",
    version,
    about = "Browse, publish and download card packages",
    long_about = "Client for the card package catalog.
Downloads packages together with their dependencies and compiles their lorebooks into one file."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use the local development catalog (same as CPM_DEBUG)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Directory for downloaded packages and compiled lorebooks
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search packages in the catalog
    Search(SearchArgs),

    /// Display information about a package
    Info(InfoArgs),

    /// Upload metadata about a package to the catalog
    Upload(UploadArgs),

    /// Update the metadata of a package
    Update(UpdateArgs),

    /// Download packages and their dependencies
    Download(DownloadArgs),

    /// Download packages and compile them into a single lorebook
    Compile(CompileArgs),

    /// Show the tail of the audit log
    Debug,
}

/// Arguments for the search command
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Comma-separated tags, all of which must match
    #[arg(short, long)]
    pub tags: Option<String>,

    /// First page to show
    #[arg(short, long, default_value_t = 0)]
    pub page: u32,

    /// Substring of the package name
    #[arg(short, long)]
    pub name: Option<String>,
}

impl SearchArgs {
    /// Tag filter as a list
    pub fn tag_list(&self) -> Option<Vec<String>> {
        self.tags
            .as_ref()
            .map(|tags| tags.split(',').map(|tag| tag.to_string()).collect())
    }
}

/// Arguments for the info command
#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// Package name
    pub name: String,
}

/// Arguments for the upload command
#[derive(Args, Debug, Clone, Default)]
pub struct UploadArgs {
    /// YAML file with the package fields; prompts when absent
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Arguments for the update command
#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// Package name
    pub name: String,

    /// YAML file with the fields to change; prompts when absent
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Comma-separated package names
    #[arg(value_name = "NAME[,NAME...]")]
    pub name: String,
}

/// Arguments for the compile command
#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// Comma-separated package names; the first one is the template
    #[arg(value_name = "NAME[,NAME...]")]
    pub name: String,

    /// Output file
    #[arg(short, long, value_name = "FILE", default_value = files::DEFAULT_COMPILED)]
    pub file: PathBuf,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Console verbosity selected by the global flags
    pub fn verbosity(&self) -> Verbosity {
        if self.global.quiet {
            Verbosity::Quiet
        } else if self.global.very_verbose {
            Verbosity::VeryVerbose
        } else if self.global.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}
