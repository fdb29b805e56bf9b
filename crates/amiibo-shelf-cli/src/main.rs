//! Amiibo Shelf - track an amiibo collection from the terminal.
//!
//! Catalog and detail data come from the public amiibo API and are cached
//! on disk, so everything except the first download works offline.

mod cli;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use amiibo_shelf_core::collection::{unique_game_series, unique_types};
use amiibo_shelf_core::share::token_from_input;
use amiibo_shelf_core::sync::{self, DataOrigin};
use amiibo_shelf_core::transfer::EXPORT_FILE_NAME;
use amiibo_shelf_core::utils::{format_release_date, truncate_string};
use amiibo_shelf_core::{
    ApiClient, CacheManager, Config, FileStore, ItemDetail, OfflineSource, RemoteSource, Tracker,
};

use cli::{Cli, Commands, ConfigArgs};

/// Width of the name column in `list` output
const NAME_COLUMN_WIDTH: usize = 32;

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug). The returned
/// guard must be held until exit so buffered file output is flushed.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Log file path has no file name: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;
    info!("Amiibo Shelf starting");

    if let Commands::Config { settings } = &cli.command {
        return edit_config(settings);
    }

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    let store = FileStore::open(&cache_dir, config.cache_quota_bytes)
        .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;
    let cache = CacheManager::new(store);

    let source: Box<dyn RemoteSource> = if cli.offline {
        Box::new(OfflineSource)
    } else {
        Box::new(ApiClient::new(config.api_base_url()).context("Invalid API base URL")?)
    };

    let mut tracker = match cli.shared.as_deref() {
        Some(input) => Tracker::from_share_token(cache, &token_from_input(input)),
        None => Tracker::init(cache),
    }
    .context("Failed to load collection")?;
    if cli.shared.is_some() && !tracker.is_shared() {
        eprintln!("Share link could not be read; showing your own collection.");
    }

    if cli.command.needs_catalog() {
        match sync::load_catalog(tracker.cache(), source.as_ref()).await {
            Ok(loaded) => {
                if loaded.origin == DataOrigin::CacheOffline {
                    eprintln!("Offline: showing cached catalog.");
                }
                tracker.set_catalog(loaded.data);
            }
            Err(e) => eprintln!("Catalog unavailable: {}", e),
        }
    }

    let result = run(cli.command, &mut tracker, source.as_ref(), &config).await;

    if let Err(e) = tracker.flush() {
        eprintln!("Warning: changes could not be saved: {}", e);
    }

    info!("Amiibo Shelf shutting down");
    result
}

async fn run(
    command: Commands,
    tracker: &mut Tracker<FileStore>,
    source: &dyn RemoteSource,
    config: &Config,
) -> Result<()> {
    match command {
        Commands::List { filter, json } => {
            let filter = filter.to_filter(tracker.is_shared());
            let shown = filter.apply(tracker.items());
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
                return Ok(());
            }
            for entry in &shown {
                let item = &entry.item;
                println!(
                    "{}{} {:<16} {:<width$} {} ({})",
                    if entry.is_owned() { "O" } else { "-" },
                    if entry.is_favorite() { "*" } else { " " },
                    item.identifier,
                    truncate_string(&item.display_name, NAME_COLUMN_WIDTH),
                    item.game_series,
                    item.item_type,
                    width = NAME_COLUMN_WIDTH,
                );
            }
            println!("{} of {} shown", shown.len(), tracker.items().len());
        }

        Commands::Stats => {
            let stats = tracker.stats();
            println!("Total:     {}", stats.total);
            println!("Owned:     {}", stats.owned);
            println!("Favorites: {}", stats.favorites);
            println!("Series:    {}", unique_game_series(tracker.items()).len());
            println!("Types:     {}", unique_types(tracker.items()).join(", "));
        }

        Commands::Own { id } => {
            let status = tracker.toggle_owned(&id)?;
            let name = display_name(tracker, &id);
            println!("{}: {}", name, if status.owned { "owned" } else { "not owned" });

            if status.owned {
                if let Some(entry) = tracker.find(&id) {
                    let name = entry.item.display_name.clone();
                    if let Err(e) = sync::load_detail(tracker.cache(), source, &name).await {
                        warn!(name = %name, error = %e, "Detail prefetch failed");
                    }
                }
            }
        }

        Commands::Favorite { id } => {
            let status = tracker.toggle_favorite(&id)?;
            let name = display_name(tracker, &id);
            println!(
                "{}: {}",
                name,
                if status.favorite { "favorite" } else { "not a favorite" }
            );
        }

        Commands::Detail { id } => {
            let entry = tracker
                .find(&id)
                .ok_or_else(|| anyhow!("No item with identifier {} in the catalog", id))?;
            let name = entry.item.display_name.clone();

            let ticket = tracker.open_detail(&name);
            let loaded = sync::load_detail(tracker.cache(), source, &name)
                .await
                .with_context(|| format!("Failed to load detail for {}", name))?;
            if loaded.origin == DataOrigin::CacheOffline {
                eprintln!("Offline: showing cached detail.");
            }
            if tracker.accept_detail(&ticket, loaded.data) {
                if let Some(detail) = tracker.detail() {
                    print_detail(detail);
                }
            }
        }

        Commands::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
            let count = tracker.export_to(&path)?;
            println!("Exported {} items to {}", count, path.display());
        }

        Commands::Import { path } => {
            let count = tracker
                .import_from(&path)
                .with_context(|| format!("Failed to import {}", path.display()))?;
            println!("Imported {} items", count);
        }

        Commands::Share => {
            let url = tracker.share_url(config.share_base_url())?;
            println!("{}", url);
        }

        Commands::Prefetch => {
            let names: Vec<String> = tracker
                .items()
                .iter()
                .filter(|e| e.is_owned())
                .map(|e| e.item.display_name.clone())
                .collect();
            let summary = sync::prefetch_details(tracker.cache(), source, names).await;
            println!(
                "Details: {} downloaded, {} already cached, {} without detail, {} failed",
                summary.fetched, summary.cached, summary.missing, summary.failed
            );
        }

        Commands::CacheStatus => {
            let status = tracker.cache().status();
            match status.catalog_age {
                Some(age) => println!(
                    "Catalog:  {} items, version {}, cached {}",
                    status.catalog_items,
                    status.catalog_version.as_deref().unwrap_or("unknown"),
                    age
                ),
                None => println!("Catalog:  not cached"),
            }
            println!("Statuses: {} tracked", status.tracked_statuses);
            println!("Location: {}", tracker.cache().store().dir().display());
        }

        // Handled before the collection is opened
        Commands::Config { .. } => {}
    }
    Ok(())
}

/// Show the saved settings, or change and save them.
fn edit_config(settings: &ConfigArgs) -> Result<()> {
    let mut config = Config::load_file().context("Failed to read config")?;
    if settings.apply(&mut config) {
        config.save().context("Failed to save config")?;
        info!("Config saved");
    }

    println!("Config file: {}", Config::config_path()?.display());
    println!("API URL:     {}", config.api_base_url());
    println!("Share URL:   {}", config.share_base_url());
    match config.cache_quota_bytes {
        Some(quota) => println!("Cache quota: {} bytes", quota),
        None => println!("Cache quota: none"),
    }
    Ok(())
}

fn display_name(tracker: &Tracker<FileStore>, id: &str) -> String {
    match tracker.find(id) {
        Some(entry) => format!("{} ({})", entry.item.display_name, id),
        None => format!("{} (not in current catalog)", id),
    }
}

fn print_detail(detail: &ItemDetail) {
    println!("{}", detail.name);
    println!();
    if detail.release.is_empty() {
        println!("No release dates listed.");
    } else {
        println!("Release dates:");
        for (region, date) in detail.release.iter() {
            println!("  {:<14} {}", region.display_name(), format_release_date(date));
        }
    }

    if detail.games.is_empty() {
        println!();
        println!("No game compatibility listed.");
        return;
    }
    for (platform, games) in &detail.games {
        println!();
        println!("{} ({} games):", platform.display_name(), games.len());
        for game in games {
            let writes = if game.writes_data { " [saves data]" } else { "" };
            if game.usage_notes.is_empty() {
                println!("  - {}{}", game.game_name, writes);
            } else {
                println!(
                    "  - {}: {}{}",
                    game.game_name,
                    game.usage_notes.join("; "),
                    writes
                );
            }
        }
    }
}
