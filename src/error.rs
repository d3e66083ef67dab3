use std::path::PathBuf;

/// Errors reading or writing game records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("truncated record at byte {offset} of {path}")]
    Truncated { path: PathBuf, offset: u64 },

    #[error("{what} checksum mismatch at byte {offset} of {path}")]
    Checksum {
        path: PathBuf,
        offset: u64,
        what: &'static str,
    },

    #[error("record of {len} bytes at byte {offset} of {path} exceeds the size limit")]
    Oversized { path: PathBuf, offset: u64, len: u64 },

    #[error("failed to decode example: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("malformed example: {0}")]
    MalformedExample(String),

    #[error("control file {path} holds '{contents}', expected a file id")]
    Control { path: PathBuf, contents: String },

    #[error("failed to access {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("invalid model name '{0}'")]
    InvalidName(String),

    #[error("model '{name}' has no champion in {dir} (run with --init first)")]
    NoChampion { name: String, dir: PathBuf },

    #[error("model already initialised: {0} exists")]
    ChampionExists(PathBuf),

    #[error("snapshot directory already exists: {0}")]
    SnapshotExists(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("minibatch has {got} values, expected {expected}")]
    BatchShape { got: usize, expected: usize },

    #[error("record error: {0}")]
    Record(#[from] RecordError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Errors that can occur while generating self-play games.
#[derive(Debug, thiserror::Error)]
pub enum SelfPlayError {
    #[error("policy chose an illegal move: {0}")]
    IllegalMove(#[from] crate::game::MoveError),

    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

/// Errors while playing against a model at the terminal.
#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] crate::game::MoveError),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_display() {
        let err = RecordError::Checksum {
            path: PathBuf::from("gamedata/batch-0000003.tfrecord"),
            offset: 48,
            what: "payload",
        };
        assert_eq!(
            err.to_string(),
            "payload checksum mismatch at byte 48 of gamedata/batch-0000003.tfrecord"
        );
    }

    #[test]
    fn test_oversized_error_names_location() {
        let err = RecordError::Oversized {
            path: PathBuf::from("gamedata/batch-0000001.tfrecord"),
            offset: 32,
            len: 1 << 40,
        };
        assert_eq!(
            err.to_string(),
            "record of 1099511627776 bytes at byte 32 of gamedata/batch-0000001.tfrecord exceeds the size limit"
        );
    }

    #[test]
    fn test_snapshot_error_display() {
        let err = SnapshotError::NoChampion {
            name: "foo".to_string(),
            dir: PathBuf::from("models/foo"),
        };
        assert_eq!(
            err.to_string(),
            "model 'foo' has no champion in models/foo (run with --init first)"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("training.learning_rate must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: training.learning_rate must be > 0"
        );
    }
}
