//! Versioned model directories.
//!
//! ```text
//! models/<name>/
//!     champion/                     current best model, source of resumed training
//!         checkpoints/              model.mpk + training_state.json
//!         saved_model/              model.mpk + signature.json (inference only)
//!         metadata.json
//!     2018-08-13T23:11:51-4096/     snapshot named by creation time and global step
//!         ...
//! ```
//!
//! The training loop only ever adds timestamped snapshots; the champion is
//! written once by model initialisation and afterwards replaced by an
//! outside process. Old snapshots are never pruned.

mod manager;
mod metadata;

pub use manager::{SnapshotId, SnapshotInfo, SnapshotManager, CHAMPION, TIMESTAMP_FORMAT};
pub use metadata::{ServingSignature, SnapshotMetadata, TensorSpec, TrainingState};
