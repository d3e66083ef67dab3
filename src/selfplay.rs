//! Self-play game generation into the game-data directory.

use std::path::PathBuf;

use burn::prelude::Backend;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cancel::CancellationToken;
use crate::encoding::{TrainingExample, MOVE_COUNT};
use crate::error::SelfPlayError;
use crate::game::{GameOutcome, GameState, Player};
use crate::gamedata::GameDataWriter;
use crate::model::Policy;
use crate::search::{SearchOptions, SearchTree};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    pub games_per_file: usize,
    /// Stop after completing this many files. Unset runs until interrupted.
    pub max_files_to_write: Option<usize>,
    /// Fixed seed for noise and move sampling.
    pub seed: Option<u64>,
    /// Search readouts per move.
    pub readouts: usize,
    pub cpuct: f32,
    /// Ply from which the most visited move is always played.
    pub tempering_point: usize,
    pub dirichlet_alpha: f64,
    /// Share of the root priors replaced by noise.
    pub dirichlet_epsilon: f32,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        let search = SearchOptions::default();
        SelfPlayConfig {
            games_per_file: 100,
            max_files_to_write: None,
            seed: None,
            readouts: search.readouts,
            cpuct: search.cpuct,
            tempering_point: search.tempering_point,
            dirichlet_alpha: search.dirichlet_alpha,
            dirichlet_epsilon: search.dirichlet_epsilon,
        }
    }
}

impl SelfPlayConfig {
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            readouts: self.readouts,
            cpuct: self.cpuct,
            tempering_point: self.tempering_point,
            dirichlet_alpha: self.dirichlet_alpha,
            dirichlet_epsilon: self.dirichlet_epsilon,
        }
    }
}

/// Totals for one [`SelfPlay::run`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SelfPlayReport {
    pub files: Vec<PathBuf>,
    pub games: usize,
    pub x_wins: usize,
    pub o_wins: usize,
    pub draws: usize,
}

impl SelfPlayReport {
    fn record(&mut self, outcome: GameOutcome) {
        self.games += 1;
        match outcome {
            GameOutcome::Winner(Player::X) => self.x_wins += 1,
            GameOutcome::Winner(Player::O) => self.o_wins += 1,
            GameOutcome::Draw => self.draws += 1,
        }
    }
}

/// Plays a policy against itself, choosing each move by tree search with
/// the policy as prior.
pub struct SelfPlay {
    config: SelfPlayConfig,
    cancel: CancellationToken,
    tree: SearchTree,
    rng: StdRng,
}

impl SelfPlay {
    pub fn new(config: SelfPlayConfig, cancel: CancellationToken) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let tree = SearchTree::new(config.search_options());
        SelfPlay {
            config,
            cancel,
            tree,
            rng,
        }
    }

    /// Play one game. Every ply yields the board before the move and a
    /// one-hot of the move the search picked.
    pub fn play_game<B: Backend>(
        &mut self,
        policy: &Policy<B>,
    ) -> Result<(Vec<TrainingExample>, GameOutcome), SelfPlayError> {
        let mut state = GameState::initial();
        let mut examples = Vec::with_capacity(MOVE_COUNT);
        loop {
            if let Some(outcome) = state.outcome() {
                return Ok((examples, outcome));
            }
            let result = self.tree.search(&state, policy, &mut self.rng)?;
            examples.push(TrainingExample::from_move(state.encode(), result.chosen));
            state.apply_move_mut(result.chosen)?;
        }
    }

    /// Fill record files with games until `max_files_to_write` files are
    /// complete or the token is cancelled. A file interrupted part way is
    /// still completed if it holds a game, and deleted otherwise.
    pub fn run<B: Backend>(
        &mut self,
        policy: &Policy<B>,
        writer: &GameDataWriter,
    ) -> Result<SelfPlayReport, SelfPlayError> {
        let mut report = SelfPlayReport::default();
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            if self
                .config
                .max_files_to_write
                .is_some_and(|max| report.files.len() >= max)
            {
                break;
            }

            let mut file = writer.begin()?;
            while file.games() < self.config.games_per_file && !self.cancel.is_cancelled() {
                let (examples, outcome) = self.play_game(policy)?;
                file.write_game(&examples)?;
                report.record(outcome);
            }

            if file.games() > 0 {
                report.files.push(writer.finish(file)?);
            } else {
                debug!("Abandoning empty {}", file.path().display());
                writer.abandon(file)?;
            }
        }

        info!(
            "Self-play wrote {} games to {} files (x {} / o {} / draw {})",
            report.games,
            report.files.len(),
            report.x_wins,
            report.o_wins,
            report.draws
        );
        Ok(report)
    }
}
