#![recursion_limit = "256"]

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use ttt_selfplay::config::AppConfig;
use ttt_selfplay::game::Player;
use ttt_selfplay::interactive::InteractiveSession;
use ttt_selfplay::model::InferBackend;
use ttt_selfplay::snapshot::SnapshotManager;

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    X,
    O,
}

/// Play a game against a model's champion.
#[derive(Parser)]
#[command(name = "play", about = "Play tic-tac-toe against a model's champion")]
struct Cli {
    /// Model to play against
    name: String,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the directory holding models/
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Side you play; x moves first
    #[arg(long, value_enum, default_value = "x")]
    human: Side,

    /// Search readouts per model move
    #[arg(long)]
    readouts: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(root) = cli.data_root {
        app_config.paths.data_root = root;
    }
    if let Some(readouts) = cli.readouts {
        app_config.selfplay.readouts = readouts;
    }
    app_config.validate().context("invalid configuration")?;

    let _logger = ttt_selfplay::logging::init(&app_config.logging).context("starting logger")?;

    let device = Default::default();
    let manager = SnapshotManager::new(&app_config.paths.models_root(), &cli.name)?;
    let policy = manager
        .load_champion_policy::<InferBackend>(&device)
        .with_context(|| format!("loading champion of '{}'", cli.name))?;

    // strongest play: no root noise, always the most visited move
    let mut options = app_config.selfplay.search_options();
    options.dirichlet_epsilon = 0.0;
    options.tempering_point = 0;

    let human = match cli.human {
        Side::X => Player::X,
        Side::O => Player::O,
    };
    let mut session = InteractiveSession::new(&policy, options, human, app_config.selfplay.seed);
    session
        .run(io::stdin().lock(), &mut io::stdout().lock())
        .context("playing")?;
    Ok(())
}
