//! The resumable training loop over the game-data directory.

pub mod trainer;

pub use trainer::{TrainReport, Trainer, TrainerConfig, TrainingUpdate};
