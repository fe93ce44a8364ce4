use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use feedrelay::cli::{Cli, Commands};
use feedrelay::config::Config;
use feedrelay::services::{
    export_opml, scheduler, CommandService, FeedCache, IngestService, NotificationService,
};
use feedrelay::sources::RssAtomFetcher;
use feedrelay::storage::StateStore;

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Before parsing so .env can supply FEEDRELAY_STATE_DIR
    Config::load_dotenv();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd_run(&cli.state_dir),
        Commands::Compact => cmd_compact(&cli.state_dir),
        Commands::Status => cmd_status(&cli.state_dir),
        Commands::Export { output } => cmd_export(&cli.state_dir, output),
    }
}

fn cmd_run(state_dir: &Path) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let store = Arc::new(
        StateStore::open(state_dir)
            .with_context(|| format!("cannot open state in {}", state_dir.display()))?,
    );
    let cache = Arc::new(FeedCache::new());
    let fetcher = Arc::new(RssAtomFetcher::new(Some(&config.proxy_url), config.fetch_timeout)?);
    let bot = Arc::new(NotificationService::new(&config)?);

    let ingest = Arc::new(IngestService::new(
        Arc::clone(&store),
        Arc::clone(&cache),
        fetcher.clone(),
        bot.clone(),
    ));
    let commands = Arc::new(CommandService::new(store, cache, fetcher, bot.clone()));

    info!(interval_secs = config.poll_interval.as_secs(), "Starting feed relay");
    scheduler::spawn_poller(ingest, config.poll_interval)?;
    scheduler::run_updates(bot, commands)
}

fn cmd_compact(state_dir: &Path) -> anyhow::Result<()> {
    let store = StateStore::open(state_dir)
        .with_context(|| format!("cannot compact state in {}", state_dir.display()))?;

    println!(
        "Compacted: {} sources, {} recipients, {} seen items",
        store.sources()?.len(),
        store.recipients()?.len(),
        store.seen_count()?
    );
    Ok(())
}

fn cmd_status(state_dir: &Path) -> anyhow::Result<()> {
    let state = StateStore::recover(state_dir)
        .with_context(|| format!("cannot read state in {}", state_dir.display()))?;

    println!("Sources: {}", state.sources().len());
    for (index, url) in state.sources().iter().enumerate() {
        println!("  {}. {}", index, url);
    }
    println!("Recipients: {}", state.recipients().len());
    println!("Seen items: {}", state.seen().len());
    Ok(())
}

fn cmd_export(state_dir: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let state = StateStore::recover(state_dir)
        .with_context(|| format!("cannot read state in {}", state_dir.display()))?;
    let opml = export_opml(state.sources())?;

    match output {
        Some(path) => {
            fs::write(&path, &opml)?;
            println!("Exported {} sources to {}", state.sources().len(), path.display());
        }
        None => {
            println!("{}", opml);
        }
    }

    Ok(())
}
