#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use ttt_selfplay::cancel::{install_interrupt_handler, CancellationToken};
use ttt_selfplay::config::AppConfig;
use ttt_selfplay::gamedata::GameDataDir;
use ttt_selfplay::model::{sgd_session, InferBackend, TicTacToeNetConfig, TrainBackend};
use ttt_selfplay::snapshot::{SnapshotManager, TrainingState};
use ttt_selfplay::training::Trainer;

/// Train a Tic-Tac-Toe policy network on self-play data.
#[derive(Parser)]
#[command(name = "train", about = "Train a Tic-Tac-Toe policy network on self-play data")]
struct Cli {
    /// Model name; snapshots live under <models_dir>/<name>
    name: String,

    /// Create the model with fresh weights instead of training it
    #[arg(long)]
    init: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the directory holding models/ and gamedata/
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Stop after this many snapshots
    #[arg(long)]
    rounds: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(root) = cli.data_root {
        app_config.paths.data_root = root;
    }
    if let Some(rounds) = cli.rounds {
        app_config.training.max_rounds = Some(rounds);
    }
    app_config.validate().context("invalid configuration")?;

    let _logger = ttt_selfplay::logging::init(&app_config.logging).context("starting logger")?;

    let manager = SnapshotManager::new(&app_config.paths.models_root(), &cli.name)?;
    if cli.init {
        init(&manager, &app_config)
    } else {
        train(manager, &app_config)
    }
}

/// Write the champion and first snapshot of a new model.
fn init(manager: &SnapshotManager, config: &AppConfig) -> Result<()> {
    let device = Default::default();
    let model = TicTacToeNetConfig::new()
        .with_hidden_units(config.model.hidden_units)
        .init::<InferBackend>(&device);
    let state = TrainingState::fresh(
        config.training.learning_rate,
        config.training.minibatch_size,
        config.model.hidden_units,
    );
    let (champion, snapshot) = manager
        .init_model(&model, &state)
        .with_context(|| format!("initialising model '{}'", manager.name()))?;
    info!("Champion: {}", champion.path.display());
    info!("First snapshot: {}", snapshot.path.display());
    Ok(())
}

/// Resume from the champion and train until interrupted or out of rounds.
fn train(manager: SnapshotManager, config: &AppConfig) -> Result<()> {
    let device = Default::default();
    let (model, mut state) = manager
        .load_champion::<TrainBackend>(&device)
        .with_context(|| format!("loading champion of '{}'", manager.name()))?;

    if state.learning_rate != config.training.learning_rate {
        warn!(
            "Learning rate {} from config replaces {} stored with the champion",
            config.training.learning_rate, state.learning_rate
        );
        state.learning_rate = config.training.learning_rate;
    }
    state.minibatch_size = config.training.minibatch_size;
    info!(
        "Resuming '{}' at step {} ({} hidden units)",
        manager.name(),
        state.global_step,
        state.hidden_units
    );

    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel).context("installing Ctrl-C handler")?;

    let mut session = sgd_session(model, state, device);
    let gamedata = GameDataDir::new(config.paths.gamedata_root());
    let mut trainer = Trainer::new(config.training.clone(), gamedata, manager, cancel);
    let report = trainer.run(&mut session).context("training")?;

    match report.snapshots.last() {
        Some(last) => info!("Latest snapshot: {}", last.path.display()),
        None => info!("No snapshot written"),
    }
    Ok(())
}
