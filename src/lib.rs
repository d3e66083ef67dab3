//! # TTT Self-Play
//!
//! A Tic-Tac-Toe policy network trained on its own games. Self-play writes
//! positions into a rotating directory of record files; the trainer keeps
//! passing over the completed files and writes a timestamped snapshot of the
//! model after every round. Built on the Burn ML framework.
//!
//! ## Modules
//!
//! - [`game`] — Board, player and move rules
//! - [`encoding`] — 19-byte board encoding and training examples
//! - [`record`] — TFRecord framing and `tf.Example` payloads
//! - [`gamedata`] — The rotating game-data directory
//! - [`dataset`] — Loading completed files into minibatches
//! - [`model`] — Policy network, training session, inference policy
//! - [`snapshot`] — Champion and timestamped model snapshots
//! - [`training`] — The round/epoch training loop
//! - [`search`] — Policy-guided tree search for move choice
//! - [`selfplay`] — Game generation from the champion
//! - [`interactive`] — Playing a model from the terminal
//! - [`cancel`] — Ctrl-C cancellation token
//! - [`config`] — TOML configuration loading and validation
//! - [`logging`] — Logger setup
//! - [`error`] — Structured error types

#![recursion_limit = "256"]

pub mod cancel;
pub mod config;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod game;
pub mod gamedata;
pub mod interactive;
pub mod logging;
pub mod model;
pub mod record;
pub mod search;
pub mod selfplay;
pub mod snapshot;
pub mod training;
