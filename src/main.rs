// tunedeck - type your way through a music catalog
// Menus on top, a queue underneath, a silent clock standing in for the speakers

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tunedeck::{
    behavior::BanList,
    catalog::LocalCatalog,
    config::Config,
    player::{PlaybackQueue, SilentEngine},
    ui::{events::TerminalInput, Navigator, TerminalDisplay, TerminalManager},
};

#[derive(Parser)]
#[command(name = "tunedeck", version)]
#[command(about = "Keyboard-driven terminal client for a music catalog")]
struct Args {
    /// Debug-level logging
    #[arg(long)]
    dev: bool,

    /// Catalog JSON file, overrides the config
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Config file to use instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,
}

// The terminal belongs to the UI, so logs only ever go to files
fn init_logging(log_dir: &Path, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "tunedeck.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if dev { "debug" } else { "info,tunedeck=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let _guard = init_logging(&config.log_dir, args.dev)?;
    info!("tunedeck {} starting up", env!("CARGO_PKG_VERSION"));

    let catalog_path = args.catalog.unwrap_or_else(|| config.catalog_path.clone());
    let catalog = LocalCatalog::load_or_empty(&catalog_path);
    let bans = BanList::load(config.banned_artists_path.clone());
    let queue = PlaybackQueue::new(Box::new(SilentEngine::new()), bans, config.queue_settings());

    let display = TerminalDisplay::new(TerminalManager::new()?);
    let mut navigator = Navigator::new(
        Arc::new(catalog),
        queue,
        display,
        TerminalInput::new(),
        config.timing(),
    )
    .with_display_name(&config.display_name);

    let result = navigator.run().await;
    // restore the terminal before anything gets printed
    drop(navigator);
    result
}
