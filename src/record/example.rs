use std::collections::HashMap;

use prost::Message;

use crate::encoding::{BoardEncoding, TrainingExample, MOVE_COUNT};
use crate::error::RecordError;

/// Feature holding the 19-byte board encoding.
pub const GAME_FEATURE: &str = "game";
/// Feature holding the move distribution.
pub const CHOICE_FEATURE: &str = "choice";

// Wire-compatible subset of tensorflow/core/example/{example,feature}.proto.

#[derive(Clone, PartialEq, Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Features {
    #[prost(map = "string, message", tag = "1")]
    pub feature: HashMap<String, Feature>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2, 3")]
    pub kind: Option<feature::Kind>,
}

pub mod feature {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
        #[prost(message, tag = "3")]
        Int64List(super::Int64List),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Int64List {
    #[prost(int64, repeated, tag = "1")]
    pub value: Vec<i64>,
}

/// Serialize a training example as a `tf.Example`.
pub fn encode_example(example: &TrainingExample) -> Vec<u8> {
    let mut feature = HashMap::with_capacity(2);
    feature.insert(
        GAME_FEATURE.to_string(),
        Feature {
            kind: Some(feature::Kind::BytesList(BytesList {
                value: vec![example.board.as_bytes().to_vec()],
            })),
        },
    );
    feature.insert(
        CHOICE_FEATURE.to_string(),
        Feature {
            kind: Some(feature::Kind::FloatList(FloatList {
                value: example.choice.to_vec(),
            })),
        },
    );
    Example {
        features: Some(Features { feature }),
    }
    .encode_to_vec()
}

/// Parse a `tf.Example` into a training example, checking both shapes.
pub fn decode_example(bytes: &[u8]) -> Result<TrainingExample, RecordError> {
    let example = Example::decode(bytes)?;
    let features = example
        .features
        .map(|f| f.feature)
        .unwrap_or_default();

    let game = match features.get(GAME_FEATURE).and_then(|f| f.kind.as_ref()) {
        Some(feature::Kind::BytesList(list)) if list.value.len() == 1 => &list.value[0],
        other => return Err(malformed(GAME_FEATURE, "a single bytes value", other)),
    };
    let board = BoardEncoding::try_from(game.as_slice())?;

    let choice = match features.get(CHOICE_FEATURE).and_then(|f| f.kind.as_ref()) {
        Some(feature::Kind::FloatList(list)) => &list.value,
        other => return Err(malformed(CHOICE_FEATURE, "a float list", other)),
    };
    let choice: [f32; MOVE_COUNT] = choice.as_slice().try_into().map_err(|_| {
        RecordError::MalformedExample(format!(
            "'{CHOICE_FEATURE}' has {} values, expected {MOVE_COUNT}",
            choice.len()
        ))
    })?;

    Ok(TrainingExample { board, choice })
}

fn malformed(name: &str, expected: &str, found: Option<&feature::Kind>) -> RecordError {
    let found = match found {
        None => "nothing".to_string(),
        Some(feature::Kind::BytesList(l)) => format!("{} bytes values", l.value.len()),
        Some(feature::Kind::FloatList(l)) => format!("{} float values", l.value.len()),
        Some(feature::Kind::Int64List(l)) => format!("{} int64 values", l.value.len()),
    };
    RecordError::MalformedExample(format!("'{name}' should be {expected}, found {found}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;

    #[test]
    fn test_encode_decode() {
        let board = GameState::initial().apply_move(4).unwrap().encode();
        let example = TrainingExample::from_move(board, 0);

        let decoded = decode_example(&encode_example(&example)).unwrap();
        assert_eq!(decoded, example);
    }

    #[test]
    fn test_rejects_missing_game() {
        let mut feature = HashMap::new();
        feature.insert(
            CHOICE_FEATURE.to_string(),
            Feature {
                kind: Some(feature::Kind::FloatList(FloatList {
                    value: vec![0.0; MOVE_COUNT],
                })),
            },
        );
        let bytes = Example {
            features: Some(Features { feature }),
        }
        .encode_to_vec();

        let err = decode_example(&bytes).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed example: 'game' should be a single bytes value, found nothing"
        );
    }

    #[test]
    fn test_rejects_short_choice() {
        let board = GameState::initial().encode();
        let mut feature = HashMap::new();
        feature.insert(
            GAME_FEATURE.to_string(),
            Feature {
                kind: Some(feature::Kind::BytesList(BytesList {
                    value: vec![board.as_bytes().to_vec()],
                })),
            },
        );
        feature.insert(
            CHOICE_FEATURE.to_string(),
            Feature {
                kind: Some(feature::Kind::FloatList(FloatList {
                    value: vec![1.0, 0.0],
                })),
            },
        );
        let bytes = Example {
            features: Some(Features { feature }),
        }
        .encode_to_vec();

        assert!(matches!(
            decode_example(&bytes),
            Err(RecordError::MalformedExample(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            decode_example(&[0xff, 0xff, 0xff]),
            Err(RecordError::Decode(_))
        ));
    }
}
