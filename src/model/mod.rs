//! The policy network, the session that trains it, and an inference-only
//! policy loaded from a serving export.

mod network;
mod policy;
mod session;
pub mod state_encoding;

pub use network::{TicTacToeNet, TicTacToeNetConfig, DEFAULT_HIDDEN_UNITS};
pub use policy::Policy;
pub use session::{sgd_session, TrainingSession, DEFAULT_LEARNING_RATE};

use burn::backend::{Autodiff, NdArray};

/// CPU backend used for inference and self-play.
pub type InferBackend = NdArray<f32>;
/// Backend used for training.
pub type TrainBackend = Autodiff<InferBackend>;
