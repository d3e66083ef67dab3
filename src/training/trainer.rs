use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;

use burn::optim::Optimizer;
use burn::tensor::backend::AutodiffBackend;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cancel::CancellationToken;
use crate::dataset::Dataset;
use crate::error::TrainError;
use crate::gamedata::GameDataDir;
use crate::model::{TicTacToeNet, TrainingSession, DEFAULT_LEARNING_RATE};
use crate::snapshot::{SnapshotInfo, SnapshotManager};

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub minibatch_size: usize,
    /// Epochs per round; one snapshot is written at the end of each round.
    pub snapshot_epochs: usize,
    pub learning_rate: f64,
    /// Stop after this many snapshotting rounds. Unset runs until interrupted.
    pub max_rounds: Option<usize>,
    /// Log the loss every this many minibatches.
    pub log_interval: u64,
    /// How long to wait before looking again when there is nothing to train on.
    pub idle_poll_secs: u64,
    /// Fixed seed for the epoch shuffle.
    pub shuffle_seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            minibatch_size: 128,
            snapshot_epochs: 1,
            learning_rate: DEFAULT_LEARNING_RATE,
            max_rounds: None,
            log_interval: 1000,
            idle_poll_secs: 10,
            shuffle_seed: None,
        }
    }
}

/// What a call to [`Trainer::run`] did.
#[derive(Debug, Default)]
pub struct TrainReport {
    /// Rounds that ended in a snapshot.
    pub rounds: usize,
    pub epochs: u64,
    pub minibatches: u64,
    pub snapshots: Vec<SnapshotInfo>,
    pub cancelled: bool,
}

/// Progress events sent to an optional observer.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingUpdate {
    Step { global_step: u64, loss: f32 },
    EpochDone { round: usize, epoch: usize, minibatches: usize, complete: bool },
    Snapshot { global_step: u64, path: PathBuf },
}

/// Trains a session on the completed game-data files and snapshots it
/// after every round.
pub struct Trainer {
    config: TrainerConfig,
    gamedata: GameDataDir,
    snapshots: SnapshotManager,
    cancel: CancellationToken,
    rng: StdRng,
    updates: Option<Sender<TrainingUpdate>>,
}

impl Trainer {
    pub fn new(
        config: TrainerConfig,
        gamedata: GameDataDir,
        snapshots: SnapshotManager,
        cancel: CancellationToken,
    ) -> Self {
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Trainer {
            config,
            gamedata,
            snapshots,
            cancel,
            rng,
            updates: None,
        }
    }

    /// Report progress on `tx`. A dropped receiver is ignored.
    pub fn with_updates(mut self, tx: Sender<TrainingUpdate>) -> Self {
        self.updates = Some(tx);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn send(&self, update: TrainingUpdate) {
        if let Some(tx) = &self.updates {
            let _ = tx.send(update);
        }
    }

    /// Run rounds until `max_rounds` is reached or the token is cancelled.
    ///
    /// A round is `snapshot_epochs` passes over the data, reloading the
    /// directory each time so newly completed files are picked up. A round
    /// that consumed at least one minibatch ends with a snapshot, even when
    /// it was cut short by cancellation. A round that found nothing to
    /// train on waits `idle_poll_secs` and does not count.
    pub fn run<B, O>(
        &mut self,
        session: &mut TrainingSession<B, O>,
    ) -> Result<TrainReport, TrainError>
    where
        B: AutodiffBackend,
        O: Optimizer<TicTacToeNet<B>, B>,
    {
        let mut report = TrainReport::default();
        info!(
            "Training '{}' from step {} ({} epochs per snapshot, minibatch {})",
            self.snapshots.name(),
            session.global_step(),
            self.config.snapshot_epochs,
            self.config.minibatch_size
        );

        loop {
            if self.config.max_rounds.is_some_and(|max| report.rounds >= max) {
                break;
            }
            if self.cancel.is_cancelled() {
                break;
            }

            let round = report.rounds + 1;
            let start_step = session.global_step();
            for epoch in 1..=self.config.snapshot_epochs {
                if self.cancel.is_cancelled() {
                    break;
                }
                if self.run_epoch(session, round, epoch)? {
                    report.epochs += 1;
                }
            }

            let consumed = session.global_step() - start_step;
            if consumed > 0 {
                report.minibatches += consumed;
                let model = session.inference_model();
                let snapshot = self.snapshots.take_snapshot(&model, session.state())?;
                self.send(TrainingUpdate::Snapshot {
                    global_step: snapshot.metadata.global_step,
                    path: snapshot.path.clone(),
                });
                report.snapshots.push(snapshot);
                report.rounds += 1;
            } else if !self.cancel.is_cancelled() {
                info!(
                    "Not enough data in {} for a minibatch, checking again in {}s",
                    self.gamedata.path().display(),
                    self.config.idle_poll_secs
                );
                self.cancel
                    .sleep(Duration::from_secs(self.config.idle_poll_secs));
            }
        }

        report.cancelled = self.cancel.is_cancelled();
        info!(
            "Training stopped at step {} after {} rounds{}",
            session.global_step(),
            report.rounds,
            if report.cancelled { " (interrupted)" } else { "" }
        );
        Ok(report)
    }

    /// One pass over the current data. Returns whether every minibatch was
    /// consumed.
    fn run_epoch<B, O>(
        &mut self,
        session: &mut TrainingSession<B, O>,
        round: usize,
        epoch: usize,
    ) -> Result<bool, TrainError>
    where
        B: AutodiffBackend,
        O: Optimizer<TicTacToeNet<B>, B>,
    {
        let mut dataset = Dataset::load(&self.gamedata)?;
        let batches = dataset.batch_count(self.config.minibatch_size);
        if batches == 0 {
            debug!(
                "{} examples in {} files, fewer than one minibatch",
                dataset.len(),
                dataset.files().len()
            );
            return Ok(false);
        }
        dataset.shuffle(&mut self.rng);

        let mut steps = 0;
        let mut loss_sum = 0.0f64;
        for batch in dataset.minibatches(self.config.minibatch_size) {
            if self.cancel.is_cancelled() {
                break;
            }
            let loss = session.train_step(&batch)?;
            loss_sum += f64::from(loss);
            steps += 1;
            self.send(TrainingUpdate::Step {
                global_step: session.global_step(),
                loss,
            });
            if session.global_step() % self.config.log_interval.max(1) == 0 {
                info!("step {} loss {:.5}", session.global_step(), loss);
            }
        }

        let complete = steps == batches;
        if complete {
            session.record_epoch();
        }
        self.send(TrainingUpdate::EpochDone {
            round,
            epoch,
            minibatches: steps,
            complete,
        });
        info!(
            "Round {round} epoch {epoch}: {steps}/{batches} minibatches from {} files, mean loss {:.5}",
            dataset.files().len(),
            if steps > 0 { loss_sum / steps as f64 } else { 0.0 }
        );
        Ok(complete)
    }
}
