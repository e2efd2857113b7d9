//! Command handlers for the Card Package Manager CLI
//!
//! This module implements the command handlers that connect the parsed
//! arguments to the catalog client and the package pipeline.

use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tokio::sync::oneshot;

use crate::app::{
    collect_item_data, compile_bundle, parse_names, write_lorebook, CatalogClient, Downloader,
    Item, ItemSummary, PackageBundle,
};
use crate::cli::{CompileArgs, DownloadArgs, InfoArgs, SearchArgs, UpdateArgs, UploadArgs};
use crate::config::AppConfig;
use crate::constants::{catalog, logging as log_constants};
use crate::errors::{AppError, ClientError, Result};
use crate::logging::{latest_log_file, tail, ChannelLogger};

const LOG: ChannelLogger = ChannelLogger::new("command");

const PAGE_RULE: &str = "======================================";

/// Handle the search command
///
/// Prints one page of names at a time. A full page waits for enter before
/// fetching the next; end of input or Ctrl-C stops paging.
pub async fn handle_search(client: &CatalogClient, args: SearchArgs) -> Result<()> {
    search_catalog(client, &args, &mut io::stdout(), wait_for_next_page).await
}

/// Page through the catalog, asking `next_page` before each further page
pub async fn search_catalog<W, F, Fut>(
    client: &CatalogClient,
    args: &SearchArgs,
    out: &mut W,
    mut next_page: F,
) -> Result<()>
where
    W: Write,
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let tags = args.tag_list();
    let mut page = args.page;

    loop {
        let items = client
            .list_items(page, tags.as_deref(), args.name.as_deref())
            .await?;

        if !print_page(out, &items)? {
            break;
        }
        writeln!(out, "{}", PAGE_RULE)?;
        out.flush()?;

        if !next_page().await {
            break;
        }
        page += 1;
    }

    Ok(())
}

/// Print item names; true if the page was full
fn print_page<W: Write>(out: &mut W, items: &[ItemSummary]) -> io::Result<bool> {
    for item in items {
        writeln!(out, "{}", item.name)?;
    }
    Ok(items.len() >= catalog::PAGE_SIZE)
}

/// Wait for enter on stdin; false on end of input or Ctrl-C
async fn wait_for_next_page() -> bool {
    print!("Press enter to see the next page...");
    if io::stdout().flush().is_err() {
        return false;
    }

    wait_for_enter(read_stdin_line(), tokio::signal::ctrl_c()).await
}

/// Read one line of stdin on a detached thread
///
/// The thread is not joined, so an interrupted read never holds up exit.
fn read_stdin_line() -> oneshot::Receiver<io::Result<usize>> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = tx.send(io::stdin().read_line(&mut line));
    });
    rx
}

/// True once a line arrives; false on end of input or when `interrupt` fires first
async fn wait_for_enter<I, T>(line: oneshot::Receiver<io::Result<usize>>, interrupt: I) -> bool
where
    I: Future<Output = T>,
{
    tokio::select! {
        read = line => matches!(read, Ok(Ok(n)) if n > 0),
        _ = interrupt => {
            println!();
            false
        }
    }
}

/// Handle the info command
pub async fn handle_info(client: &CatalogClient, args: InfoArgs) -> Result<()> {
    let item = client.get_item(&args.name).await?;
    display(&item);
    Ok(())
}

/// Handle the upload command
pub async fn handle_upload(client: &CatalogClient, args: UploadArgs) -> Result<()> {
    let data = collect_item_data(args.file.as_deref())?;
    let item = client.create_item(&data).await?;
    display(&item);
    Ok(())
}

/// Handle the update command
///
/// The entered fields are merged over the stored item before sending.
pub async fn handle_update(client: &CatalogClient, args: UpdateArgs) -> Result<()> {
    let current = client.get_item(&args.name).await?;
    let mut data = current.to_payload().map_err(ClientError::from)?;
    data.extend(collect_item_data(args.file.as_deref())?);

    let item = client.update_item(&args.name, &data).await?;
    display(&item);
    Ok(())
}

/// Handle the download command
pub async fn handle_download(
    client: &CatalogClient,
    args: DownloadArgs,
    output_dir: &Path,
) -> Result<PackageBundle> {
    tokio::fs::create_dir_all(output_dir).await?;

    let mut bundle = PackageBundle::new();
    Downloader::new(client, output_dir)
        .with_spinner()
        .download_many(&args.name, &mut bundle)
        .await?;

    LOG.info(format!("Downloaded {} packages", bundle.len()));
    Ok(bundle)
}

/// Handle the compile command
///
/// Downloads the packages, then merges their lorebooks using the first
/// requested package as the template.
pub async fn handle_compile(
    client: &CatalogClient,
    args: CompileArgs,
    output_dir: &Path,
) -> Result<PathBuf> {
    let first = parse_names(&args.name)
        .into_iter()
        .next()
        .ok_or_else(|| AppError::generic("No package name given"))?;

    let bundle = handle_download(
        client,
        DownloadArgs {
            name: args.name.clone(),
        },
        output_dir,
    )
    .await?;

    let compiled = compile_bundle(&bundle, &first)?;
    let path = if args.file.is_absolute() {
        args.file
    } else {
        output_dir.join(&args.file)
    };
    write_lorebook(&path, &compiled)?;

    LOG.user(format!(
        "Compiled {} packages into {}",
        bundle.len(),
        path.display()
    ));
    Ok(path)
}

/// Handle the debug command
pub fn handle_debug(config: &AppConfig) -> Result<()> {
    let log_dir = config.log_dir()?;
    if config.debug {
        println!("Debug mode writes the audit log to stderr, nothing to show.");
        return Ok(());
    }

    match latest_log_file(&log_dir, &config.logging.audit_file)? {
        Some(path) => {
            let stdout = io::stdout();
            render_debug(&mut stdout.lock(), &path)?;
        }
        None => println!("No audit log found in {}", log_dir.display()),
    }
    Ok(())
}

/// Print the end of an audit log between markers
pub fn render_debug<W: Write>(out: &mut W, path: &Path) -> io::Result<()> {
    let logs = tail(path, log_constants::DEBUG_TAIL_BYTES)?;

    writeln!(out)?;
    writeln!(out, "### BEGIN DEBUG LOGS ###")?;
    writeln!(out, "{}", logs)?;
    writeln!(out, "### END DEBUG LOGS ###")?;
    writeln!(out, "Log file: {}", path.display())?;
    writeln!(out)?;
    Ok(())
}

fn display(item: &Item) {
    println!("{}", item);
    println!();
}
