use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::GameDataDir;
use crate::encoding::TrainingExample;
use crate::error::RecordError;
use crate::record::{encode_example, RecordWriter};

/// Completed files kept in the game-data directory.
pub const DEFAULT_MAX_FILES: usize = 50;

/// A record file that is still being written. It carries no `.tfrecord`
/// suffix, so training never picks it up.
pub struct InProgressFile {
    id: u64,
    path: PathBuf,
    writer: RecordWriter<BufWriter<File>>,
    games: usize,
    records: usize,
}

impl InProgressFile {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn games(&self) -> usize {
        self.games
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Append every example of one finished game.
    pub fn write_game(&mut self, examples: &[TrainingExample]) -> Result<(), RecordError> {
        for example in examples {
            self.writer.write_record(&encode_example(example))?;
        }
        self.records += examples.len();
        self.games += 1;
        Ok(())
    }
}

/// Starts, finishes and rotates record files in a [`GameDataDir`].
pub struct GameDataWriter {
    dir: GameDataDir,
    max_files: usize,
}

impl GameDataWriter {
    pub fn new(dir: GameDataDir, max_files: usize) -> Self {
        GameDataWriter { dir, max_files }
    }

    pub fn dir(&self) -> &GameDataDir {
        &self.dir
    }

    /// Reserve a file id and create its in-progress file.
    pub fn begin(&self) -> Result<InProgressFile, RecordError> {
        let id = self.dir.next_file_id()?;
        let path = self.dir.in_progress_path(id);
        let file = File::create(&path).map_err(|source| RecordError::File {
            path: path.clone(),
            source,
        })?;
        debug!("Started {}", path.display());
        Ok(InProgressFile {
            id,
            path,
            writer: RecordWriter::new(BufWriter::new(file)),
            games: 0,
            records: 0,
        })
    }

    /// Flush, mark the file complete and rotate out the oldest files.
    pub fn finish(&self, mut file: InProgressFile) -> Result<PathBuf, RecordError> {
        file.writer.flush()?;
        drop(file.writer);

        let completed = self.dir.completed_path(file.id);
        fs::rename(&file.path, &completed)?;
        info!(
            "Wrote {} ({} games, {} records)",
            completed.display(),
            file.games,
            file.records
        );

        for removed in self.dir.prune(self.max_files)? {
            debug!("Rotated out {}", removed.display());
        }
        Ok(completed)
    }

    /// Discard an in-progress file without completing it.
    pub fn abandon(&self, file: InProgressFile) -> Result<(), RecordError> {
        drop(file.writer);
        fs::remove_file(&file.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use crate::record::read_examples;

    fn game() -> Vec<TrainingExample> {
        let mut state = GameState::initial();
        let mut examples = Vec::new();
        for square in [4, 0, 8] {
            examples.push(TrainingExample::from_move(state.encode(), square));
            state = state.apply_move(square).unwrap();
        }
        examples
    }

    #[test]
    fn test_in_progress_file_is_not_trainable_until_finished() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = GameDataWriter::new(GameDataDir::new(tmp.path()), DEFAULT_MAX_FILES);

        let mut file = writer.begin().unwrap();
        file.write_game(&game()).unwrap();
        assert!(writer.dir().completed_files().unwrap().is_empty());

        let path = writer.finish(file).unwrap();
        assert_eq!(writer.dir().completed_files().unwrap(), vec![path.clone()]);
        assert_eq!(read_examples(&path).unwrap(), game());
    }

    #[test]
    fn test_finish_caps_completed_files() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = GameDataWriter::new(GameDataDir::new(tmp.path()), 2);

        for _ in 0..4 {
            let mut file = writer.begin().unwrap();
            file.write_game(&game()).unwrap();
            writer.finish(file).unwrap();
        }

        let data = writer.dir();
        assert_eq!(
            data.completed_files().unwrap(),
            vec![data.completed_path(2), data.completed_path(3)]
        );
    }

    #[test]
    fn test_abandon_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = GameDataWriter::new(GameDataDir::new(tmp.path()), DEFAULT_MAX_FILES);
        let file = writer.begin().unwrap();
        let path = file.path().to_path_buf();
        writer.abandon(file).unwrap();
        assert!(!path.exists());
        // the id stays consumed
        assert_eq!(writer.begin().unwrap().id(), 1);
    }
}
