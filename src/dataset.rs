//! Training data loaded from the completed record files.

use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::encoding::{TrainingExample, ENCODING_LEN, MOVE_COUNT};
use crate::error::RecordError;
use crate::gamedata::GameDataDir;
use crate::record::read_examples;

/// A fixed-size batch flattened for the network: `len` rows of
/// `ENCODING_LEN` inputs and `MOVE_COUNT` labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Minibatch {
    pub examples: Vec<f32>,
    pub labels: Vec<f32>,
    pub len: usize,
}

impl Minibatch {
    pub fn from_examples(examples: &[TrainingExample]) -> Self {
        let mut inputs = Vec::with_capacity(examples.len() * ENCODING_LEN);
        let mut labels = Vec::with_capacity(examples.len() * MOVE_COUNT);
        for example in examples {
            inputs.extend_from_slice(&example.board.to_f32());
            labels.extend_from_slice(&example.choice);
        }
        Minibatch {
            examples: inputs,
            labels,
            len: examples.len(),
        }
    }
}

/// Every example of every completed file, as of the time it was loaded.
#[derive(Debug, Default)]
pub struct Dataset {
    examples: Vec<TrainingExample>,
    files: Vec<PathBuf>,
}

impl Dataset {
    /// Decode all completed files of `data`.
    pub fn load(data: &GameDataDir) -> Result<Self, RecordError> {
        Self::from_files(data.completed_files()?)
    }

    /// Decode `paths` in order. A file rotated away since it was listed is
    /// skipped; any other failure is returned.
    pub fn from_files(paths: impl IntoIterator<Item = PathBuf>) -> Result<Self, RecordError> {
        let mut dataset = Dataset::default();
        for path in paths {
            match read_examples(&path) {
                Ok(examples) => {
                    debug!("Loaded {} examples from {}", examples.len(), path.display());
                    dataset.examples.extend(examples);
                    dataset.files.push(path);
                }
                Err(RecordError::File { path, source }) if source.kind() == ErrorKind::NotFound => {
                    warn!("{} disappeared before it could be read", path.display());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(dataset)
    }

    pub fn from_examples(examples: Vec<TrainingExample>) -> Self {
        Dataset {
            examples,
            files: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Files the examples were read from.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.examples.shuffle(rng);
    }

    /// Number of full minibatches; the remainder is dropped.
    pub fn batch_count(&self, size: usize) -> usize {
        self.examples.len() / size.max(1)
    }

    /// Full minibatches in the current order. The iterator running out is
    /// the normal end of an epoch.
    pub fn minibatches(&self, size: usize) -> impl Iterator<Item = Minibatch> + '_ {
        self.examples
            .chunks_exact(size.max(1))
            .map(Minibatch::from_examples)
    }
}
