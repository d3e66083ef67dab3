#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ttt_selfplay::cancel::{install_interrupt_handler, CancellationToken};
use ttt_selfplay::config::AppConfig;
use ttt_selfplay::gamedata::{GameDataDir, GameDataWriter};
use ttt_selfplay::model::InferBackend;
use ttt_selfplay::selfplay::SelfPlay;
use ttt_selfplay::snapshot::SnapshotManager;

/// Generate self-play games with a model's champion.
#[derive(Parser)]
#[command(name = "generate", about = "Write self-play games from a model's champion")]
struct Cli {
    /// Model whose champion plays both sides
    name: String,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the directory holding models/ and gamedata/
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Stop after completing this many record files
    #[arg(long)]
    files: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(root) = cli.data_root {
        app_config.paths.data_root = root;
    }
    if let Some(files) = cli.files {
        app_config.selfplay.max_files_to_write = Some(files);
    }
    app_config.validate().context("invalid configuration")?;

    let _logger = ttt_selfplay::logging::init(&app_config.logging).context("starting logger")?;

    let device = Default::default();
    let manager = SnapshotManager::new(&app_config.paths.models_root(), &cli.name)?;
    let policy = manager
        .load_champion_policy::<InferBackend>(&device)
        .with_context(|| format!("loading champion of '{}'", cli.name))?;

    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel).context("installing Ctrl-C handler")?;

    let writer = GameDataWriter::new(
        GameDataDir::new(app_config.paths.gamedata_root()),
        app_config.gamedata.max_files,
    );
    SelfPlay::new(app_config.selfplay.clone(), cancel)
        .run(&policy, &writer)
        .context("generating games")?;
    Ok(())
}
