use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::DefaultRecorder;
use chrono::{Local, NaiveDateTime};
use log::{debug, info};

use crate::error::SnapshotError;
use crate::model::{Policy, TicTacToeNet, TicTacToeNetConfig};
use crate::snapshot::metadata::{ServingSignature, SnapshotMetadata, TrainingState};

/// Directory name of the champion snapshot.
pub const CHAMPION: &str = "champion";
/// Timestamp part of a snapshot name (local time, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const CHECKPOINT_DIR: &str = "checkpoints";
const SERVING_DIR: &str = "saved_model";
const MODEL_FILE: &str = "model";
const TRAINING_STATE_FILE: &str = "training_state.json";
const SIGNATURE_FILE: &str = "signature.json";
const METADATA_FILE: &str = "metadata.json";

/// Name of a snapshot directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapshotId {
    Champion,
    /// `<timestamp>-<global_step>`
    Timestamped { created: String, step: u64 },
}

impl SnapshotId {
    /// A timestamped id for the current local time.
    pub fn now(step: u64) -> Self {
        SnapshotId::Timestamped {
            created: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            step,
        }
    }

    /// Parse a directory name; `None` for anything that isn't a snapshot.
    pub fn parse(name: &str) -> Option<Self> {
        if name == CHAMPION {
            return Some(SnapshotId::Champion);
        }
        let (created, step) = name.rsplit_once('-')?;
        NaiveDateTime::parse_from_str(created, TIMESTAMP_FORMAT).ok()?;
        Some(SnapshotId::Timestamped {
            created: created.to_string(),
            step: step.parse().ok()?,
        })
    }

    pub fn is_champion(&self) -> bool {
        matches!(self, SnapshotId::Champion)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotId::Champion => f.write_str(CHAMPION),
            SnapshotId::Timestamped { created, step } => write!(f, "{created}-{step}"),
        }
    }
}

/// A snapshot found on disk.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub id: SnapshotId,
    pub path: PathBuf,
    pub metadata: SnapshotMetadata,
}

/// Writes, lists and loads the snapshots of one named model.
pub struct SnapshotManager {
    name: String,
    model_dir: PathBuf,
}

impl SnapshotManager {
    /// Manage `models_root/<name>`. Names are limited to ASCII letters,
    /// digits, `_`, `-` and `.` so they stay a single path component.
    pub fn new(models_root: &Path, name: &str) -> Result<Self, SnapshotError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(SnapshotError::InvalidName(name.to_string()));
        }
        Ok(SnapshotManager {
            name: name.to_string(),
            model_dir: models_root.join(name),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn snapshot_dir(&self, id: &SnapshotId) -> PathBuf {
        self.model_dir.join(id.to_string())
    }

    pub fn champion_dir(&self) -> PathBuf {
        self.snapshot_dir(&SnapshotId::Champion)
    }

    pub fn has_champion(&self) -> bool {
        self.champion_dir().join(METADATA_FILE).exists()
    }

    /// First-time creation: write the champion and a timestamped snapshot of
    /// the same untrained model. Refuses to touch an existing champion.
    pub fn init_model<B: Backend>(
        &self,
        model: &TicTacToeNet<B>,
        state: &TrainingState,
    ) -> Result<(SnapshotInfo, SnapshotInfo), SnapshotError> {
        let champion_dir = self.champion_dir();
        if champion_dir.exists() {
            return Err(SnapshotError::ChampionExists(champion_dir));
        }
        let champion = self.write_snapshot(SnapshotId::Champion, model, state)?;
        let snapshot = self.take_snapshot(model, state)?;
        info!(
            "Initialised model '{}' at {}",
            self.name,
            self.model_dir.display()
        );
        Ok((champion, snapshot))
    }

    /// Write a new timestamped snapshot. Never writes the champion.
    pub fn take_snapshot<B: Backend>(
        &self,
        model: &TicTacToeNet<B>,
        state: &TrainingState,
    ) -> Result<SnapshotInfo, SnapshotError> {
        let info = self.write_snapshot(SnapshotId::now(state.global_step), model, state)?;
        info!("Snapshot saved: {}", info.path.display());
        Ok(info)
    }

    /// Assemble the snapshot under `<id>.tmp`, then rename it into place.
    fn write_snapshot<B: Backend>(
        &self,
        id: SnapshotId,
        model: &TicTacToeNet<B>,
        state: &TrainingState,
    ) -> Result<SnapshotInfo, SnapshotError> {
        let final_dir = self.snapshot_dir(&id);
        if final_dir.exists() {
            return Err(SnapshotError::SnapshotExists(final_dir));
        }
        let tmp_dir = self.model_dir.join(format!("{id}.tmp"));
        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }

        let checkpoint_dir = tmp_dir.join(CHECKPOINT_DIR);
        let serving_dir = tmp_dir.join(SERVING_DIR);
        fs::create_dir_all(&checkpoint_dir)?;
        fs::create_dir_all(&serving_dir)?;

        let recorder = DefaultRecorder::default();
        model
            .clone()
            .save_file(checkpoint_dir.join(MODEL_FILE), &recorder)
            .map_err(|e| SnapshotError::ModelSave(e.to_string()))?;
        fs::write(
            checkpoint_dir.join(TRAINING_STATE_FILE),
            serde_json::to_string_pretty(state)?,
        )?;

        model
            .clone()
            .save_file(serving_dir.join(MODEL_FILE), &recorder)
            .map_err(|e| SnapshotError::ModelSave(e.to_string()))?;
        let signature = ServingSignature::for_network(state.hidden_units, state.global_step);
        fs::write(
            serving_dir.join(SIGNATURE_FILE),
            serde_json::to_string_pretty(&signature)?,
        )?;

        let metadata = SnapshotMetadata {
            id: id.to_string(),
            global_step: state.global_step,
            created_at: Local::now().to_rfc3339(),
            champion: id.is_champion(),
        };
        fs::write(
            tmp_dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        fs::rename(&tmp_dir, &final_dir)?;
        debug!("Wrote snapshot {id} at step {}", state.global_step);

        Ok(SnapshotInfo {
            id,
            path: final_dir,
            metadata,
        })
    }

    /// Network and training state from a snapshot's checkpoint.
    pub fn load_checkpoint<B: Backend>(
        &self,
        id: &SnapshotId,
        device: &B::Device,
    ) -> Result<(TicTacToeNet<B>, TrainingState), SnapshotError> {
        let dir = self.existing_dir(id)?.join(CHECKPOINT_DIR);
        let state: TrainingState = read_json(&dir.join(TRAINING_STATE_FILE))?;
        let model = load_network(&dir, state.hidden_units, device)?;
        Ok((model, state))
    }

    /// Resume point for training.
    pub fn load_champion<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(TicTacToeNet<B>, TrainingState), SnapshotError> {
        self.load_checkpoint(&SnapshotId::Champion, device)
    }

    /// Inference-only network from a snapshot's serving export.
    pub fn load_policy<B: Backend>(
        &self,
        id: &SnapshotId,
        device: &B::Device,
    ) -> Result<Policy<B>, SnapshotError> {
        let dir = self.existing_dir(id)?.join(SERVING_DIR);
        let signature: ServingSignature = read_json(&dir.join(SIGNATURE_FILE))?;
        let net = load_network(&dir, signature.hidden_units, device)?;
        Ok(Policy::new(net, device.clone()))
    }

    pub fn load_champion_policy<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<Policy<B>, SnapshotError> {
        self.load_policy(&SnapshotId::Champion, device)
    }

    /// All snapshots of this model, sorted by global step. Half-written
    /// `.tmp` directories and unrelated entries are skipped.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>, SnapshotError> {
        let mut results = Vec::new();
        if !self.model_dir.exists() {
            return Ok(results);
        }
        for entry in fs::read_dir(&self.model_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(id) = SnapshotId::parse(&name.to_string_lossy()) else {
                continue;
            };
            let meta_path = path.join(METADATA_FILE);
            if !meta_path.exists() {
                continue;
            }
            let metadata: SnapshotMetadata = read_json(&meta_path)?;
            results.push(SnapshotInfo { id, path, metadata });
        }
        results.sort_by(|a, b| {
            (a.metadata.global_step, &a.path).cmp(&(b.metadata.global_step, &b.path))
        });
        Ok(results)
    }

    fn existing_dir(&self, id: &SnapshotId) -> Result<PathBuf, SnapshotError> {
        let dir = self.snapshot_dir(id);
        if dir.exists() {
            Ok(dir)
        } else if id.is_champion() {
            Err(SnapshotError::NoChampion {
                name: self.name.clone(),
                dir: self.model_dir.clone(),
            })
        } else {
            Err(SnapshotError::ModelLoad(format!(
                "no snapshot at {}",
                dir.display()
            )))
        }
    }
}

fn load_network<B: Backend>(
    dir: &Path,
    hidden_units: usize,
    device: &B::Device,
) -> Result<TicTacToeNet<B>, SnapshotError> {
    let recorder = DefaultRecorder::default();
    TicTacToeNetConfig::new()
        .with_hidden_units(hidden_units)
        .init::<B>(device)
        .load_file(dir.join(MODEL_FILE), &recorder, device)
        .map_err(|e| SnapshotError::ModelLoad(e.to_string()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let json = fs::read_to_string(path).map_err(|e| SnapshotError::MetadataRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| SnapshotError::MetadataParse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use crate::model::InferBackend;

    fn manager(root: &Path) -> SnapshotManager {
        SnapshotManager::new(&root.join("models"), "foo").unwrap()
    }

    fn fresh_model() -> (TicTacToeNet<InferBackend>, TrainingState) {
        let device = Default::default();
        let model = TicTacToeNetConfig::new()
            .with_hidden_units(16)
            .init::<InferBackend>(&device);
        (model, TrainingState::fresh(0.01, 8, 16))
    }

    #[test]
    fn test_snapshot_id_names() {
        let id = SnapshotId::parse("2018-08-13T23:11:51-4096").unwrap();
        assert_eq!(
            id,
            SnapshotId::Timestamped {
                created: "2018-08-13T23:11:51".to_string(),
                step: 4096
            }
        );
        assert_eq!(id.to_string(), "2018-08-13T23:11:51-4096");
        assert_eq!(SnapshotId::parse("champion"), Some(SnapshotId::Champion));
        assert_eq!(SnapshotId::parse("champion.tmp"), None);
        assert_eq!(SnapshotId::parse("2018-08-13T23:11:51-x"), None);
        assert_eq!(SnapshotId::parse("notes-12"), None);

        let now = SnapshotId::now(3);
        assert_eq!(SnapshotId::parse(&now.to_string()), Some(now));
    }

    #[test]
    fn test_rejects_bad_names() {
        let root = Path::new("models");
        for name in ["", "..", "a/b", "x y"] {
            assert!(matches!(
                SnapshotManager::new(root, name),
                Err(SnapshotError::InvalidName(_))
            ));
        }
        assert!(SnapshotManager::new(root, "ttt-64_v2").is_ok());
    }

    #[test]
    fn test_init_writes_champion_and_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(tmp.path());
        let (model, state) = fresh_model();

        let (champion, snapshot) = manager.init_model(&model, &state).unwrap();
        assert!(champion.metadata.champion);
        assert_eq!(champion.path, manager.champion_dir());
        assert!(!snapshot.metadata.champion);
        assert!(snapshot.id.to_string().ends_with("-0"));

        for dir in [&champion.path, &snapshot.path] {
            assert!(dir.join("checkpoints/model.mpk").exists());
            assert!(dir.join("checkpoints/training_state.json").exists());
            assert!(dir.join("saved_model/model.mpk").exists());
            assert!(dir.join("saved_model/signature.json").exists());
            assert!(dir.join("metadata.json").exists());
        }
        assert_eq!(manager.list_snapshots().unwrap().len(), 2);
    }

    #[test]
    fn test_init_refuses_existing_champion() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(tmp.path());
        let (model, state) = fresh_model();
        manager.init_model(&model, &state).unwrap();

        let err = manager.init_model(&model, &state).unwrap_err();
        assert!(matches!(err, SnapshotError::ChampionExists(_)), "{err}");
    }

    #[test]
    fn test_take_snapshot_leaves_champion_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(tmp.path());
        let (model, mut state) = fresh_model();
        manager.init_model(&model, &state).unwrap();
        let before = fs::read(manager.champion_dir().join("checkpoints/model.mpk")).unwrap();

        state.global_step = 12;
        let info = manager.take_snapshot(&model, &state).unwrap();
        assert!(matches!(info.id, SnapshotId::Timestamped { step: 12, .. }));

        let after = fs::read(manager.champion_dir().join("checkpoints/model.mpk")).unwrap();
        assert_eq!(before, after);
        let (_, champion_state) = manager
            .load_champion::<InferBackend>(&Default::default())
            .unwrap();
        assert_eq!(champion_state.global_step, 0);
    }

    #[test]
    fn test_refuses_to_overwrite_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(tmp.path());
        let (model, state) = fresh_model();
        let id = SnapshotId::Timestamped {
            created: "2020-01-01T00:00:00".to_string(),
            step: 0,
        };
        manager.write_snapshot(id.clone(), &model, &state).unwrap();
        let err = manager.write_snapshot(id, &model, &state).unwrap_err();
        assert!(matches!(err, SnapshotError::SnapshotExists(_)));
    }

    #[test]
    fn test_load_champion_without_init() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(tmp.path());
        let err = manager
            .load_champion::<InferBackend>(&Default::default())
            .unwrap_err();
        assert!(matches!(err, SnapshotError::NoChampion { .. }), "{err}");
    }

    #[test]
    fn test_checkpoint_and_policy_match_saved_model() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(tmp.path());
        let (model, state) = fresh_model();
        manager.init_model(&model, &state).unwrap();

        let device = Default::default();
        let board = GameState::initial().encode();
        let expected = Policy::new(model, device).predict(&[board]);

        let policy = manager.load_champion_policy::<InferBackend>(&device).unwrap();
        let (restored, restored_state) = manager.load_champion::<InferBackend>(&device).unwrap();
        assert_eq!(restored_state, state);

        let from_checkpoint = Policy::new(restored, device).predict(&[board]);
        let from_serving = policy.predict(&[board]);
        for i in 0..9 {
            assert!((expected[0][i] - from_serving[0][i]).abs() < 1e-6);
            assert!((expected[0][i] - from_checkpoint[0][i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_list_skips_tmp_and_foreign_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(tmp.path());
        let (model, state) = fresh_model();
        manager.init_model(&model, &state).unwrap();
        fs::create_dir_all(manager.model_dir().join("2020-01-01T00:00:00-5.tmp")).unwrap();
        fs::create_dir_all(manager.model_dir().join("scratch")).unwrap();

        let list = manager.list_snapshots().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().filter(|s| s.id.is_champion()).count(), 1);
    }
}
