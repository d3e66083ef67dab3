use serde::{Deserialize, Serialize};

use crate::encoding::{ENCODING_LEN, MOVE_COUNT};

/// Top-level snapshot metadata written to metadata.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub id: String,
    pub global_step: u64,
    /// RFC 3339, local time.
    pub created_at: String,
    pub champion: bool,
}

/// Resumable training state written to checkpoints/training_state.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub global_step: u64,
    pub learning_rate: f64,
    pub minibatch_size: usize,
    pub hidden_units: usize,
    #[serde(default)]
    pub epochs_completed: u64,
}

impl TrainingState {
    /// State of a model that has not seen any data yet.
    pub fn fresh(learning_rate: f64, minibatch_size: usize, hidden_units: usize) -> Self {
        TrainingState {
            global_step: 0,
            learning_rate,
            minibatch_size,
            hidden_units,
            epochs_completed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub name: String,
    pub dtype: String,
    /// -1 marks the batch dimension.
    pub shape: Vec<i64>,
}

/// Describes the serving export in saved_model/signature.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingSignature {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
    pub hidden_units: usize,
    pub global_step: u64,
}

impl ServingSignature {
    pub fn for_network(hidden_units: usize, global_step: u64) -> Self {
        ServingSignature {
            inputs: vec![TensorSpec {
                name: "example".to_string(),
                dtype: "u8".to_string(),
                shape: vec![-1, ENCODING_LEN as i64],
            }],
            outputs: vec![TensorSpec {
                name: "softmax".to_string(),
                dtype: "f32".to_string(),
                shape: vec![-1, MOVE_COUNT as i64],
            }],
            hidden_units,
            global_step,
        }
    }
}
