//! On-disk game records: TFRecord framing around `tf.Example` protobufs
//! carrying a `game` board encoding and a `choice` move distribution.

mod example;
mod tfrecord;

pub use example::{decode_example, encode_example, CHOICE_FEATURE, GAME_FEATURE};
pub use tfrecord::{RecordReader, RecordWriter, MAX_RECORD_LEN};

use std::path::Path;

use crate::encoding::TrainingExample;
use crate::error::RecordError;

/// Decode every example of a record file.
pub fn read_examples(path: &Path) -> Result<Vec<TrainingExample>, RecordError> {
    RecordReader::open(path)?
        .map(|record| record.and_then(|bytes| decode_example(&bytes)))
        .collect()
}
