//! cpm CLI application
//!
//! Command-line client for the card package catalog.

use std::process;

use tracing::{debug, info};

// Import CLI modules through the library (module is public but not re-exported)
use cpm::app::CatalogClient;
use cpm::auth::load_or_create_token;
use cpm::cli::{
    handle_compile, handle_debug, handle_download, handle_info, handle_search, handle_update,
    handle_upload, Cli, Commands,
};
use cpm::config::AppConfig;
use cpm::errors::Result;
use cpm::logging::{self, ChannelLogger, LogSettings};

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if e.is_recoverable() {
            eprintln!("The catalog could not be reached, try again later.");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok(); // Ignore errors if file doesn't exist

    // Parse command line arguments
    let cli = Cli::parse_args();

    let mut config = AppConfig::load(cli.global.config.clone()).await?;
    if cli.global.debug {
        config.debug = true;
    }

    // Guards flush the file writers when run() returns
    let settings = LogSettings::from_config(&config, cli.verbosity())?;
    let _guards = logging::init(&settings)?;

    info!("cpm v{} starting", env!("CARGO_PKG_VERSION"));
    debug!("Configuration: {:?}", config);

    let result = execute(cli, &config).await;
    if let Err(e) = &result {
        ChannelLogger::new("main").error(format!("{} error: {:?}", e.category(), e));
    }
    result
}

/// Execute the selected command
async fn execute(cli: Cli, config: &AppConfig) -> Result<()> {
    let output_dir = cli.global.output_dir.as_path();

    match cli.command {
        Commands::Search(args) => handle_search(&connect(config).await?, args).await,
        Commands::Info(args) => handle_info(&connect(config).await?, args).await,
        Commands::Upload(args) => handle_upload(&connect(config).await?, args).await,
        Commands::Update(args) => handle_update(&connect(config).await?, args).await,
        Commands::Download(args) => {
            handle_download(&connect(config).await?, args, output_dir).await?;
            Ok(())
        }
        Commands::Compile(args) => {
            handle_compile(&connect(config).await?, args, output_dir).await?;
            Ok(())
        }
        // Reading the logs needs no server
        Commands::Debug => handle_debug(config),
    }
}

/// Load the auth token and connect to the catalog
async fn connect(config: &AppConfig) -> Result<CatalogClient> {
    let token = load_or_create_token(&config.token_path()?)?;
    let client = CatalogClient::connect(config.client_config(Some(token))?).await?;
    debug!("Connected to {}", client.base_url());
    Ok(client)
}
