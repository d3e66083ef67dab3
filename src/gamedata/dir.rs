use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::RecordError;

/// Name of the file holding the next file id.
pub const CONTROL_FILE: &str = "control";
/// Extension that marks a record file as complete.
pub const COMPLETED_SUFFIX: &str = "tfrecord";
pub const FILE_PREFIX: &str = "batch-";

/// A game-data directory on disk.
#[derive(Debug, Clone)]
pub struct GameDataDir {
    dir: PathBuf,
}

impl GameDataDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        GameDataDir { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn control_path(&self) -> PathBuf {
        self.dir.join(CONTROL_FILE)
    }

    /// Where file `id` lives while games are still being appended.
    pub fn in_progress_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{id:07}"))
    }

    pub fn completed_path(&self, id: u64) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{id:07}.{COMPLETED_SUFFIX}"))
    }

    /// Completed record files, oldest first. In-progress files and the
    /// control file are never listed. A missing directory has no files.
    pub fn completed_files(&self) -> Result<Vec<PathBuf>, RecordError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RecordError::File {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_completed(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| (file_id(a), a).cmp(&(file_id(b), b)));
        Ok(files)
    }

    /// Reserve the next file id: returns the stored id and stores id + 1.
    /// A missing or empty control file starts at 0.
    ///
    /// The control file is held under an exclusive lock for the
    /// read-increment-write, so concurrent generators sharing a directory
    /// never hand out the same id.
    pub fn next_file_id(&self) -> Result<u64, RecordError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.control_path();
        let mut control = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| RecordError::File {
                path: path.clone(),
                source,
            })?;
        // released when `control` is dropped
        fs2::FileExt::lock_exclusive(&control).map_err(|source| RecordError::File {
            path: path.clone(),
            source,
        })?;

        let mut contents = String::new();
        control.read_to_string(&mut contents)?;
        let id = match contents.trim() {
            "" => 0,
            s => s.parse::<u64>().map_err(|_| RecordError::Control {
                path: path.clone(),
                contents: s.to_string(),
            })?,
        };

        control.set_len(0)?;
        control.seek(SeekFrom::Start(0))?;
        write!(control, "{}", id + 1)?;
        Ok(id)
    }

    /// Delete the oldest completed files so at most `max_files` remain.
    /// Returns the deleted paths.
    pub fn prune(&self, max_files: usize) -> Result<Vec<PathBuf>, RecordError> {
        let files = self.completed_files()?;
        let excess = files.len().saturating_sub(max_files);
        let mut removed = Vec::with_capacity(excess);
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(RecordError::File { path, source }),
            }
        }
        Ok(removed)
    }
}

fn is_completed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == COMPLETED_SUFFIX)
}

/// Numeric id of a `batch-NNNNNNN.tfrecord` file; foreign names sort last.
fn file_id(path: &Path) -> u64 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix(FILE_PREFIX))
        .and_then(|s| s.parse().ok())
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_completed_files_skip_in_progress_and_control() {
        let tmp = tempfile::tempdir().unwrap();
        let data = GameDataDir::new(tmp.path());
        touch(&data.completed_path(10));
        touch(&data.completed_path(2));
        touch(&data.in_progress_path(11));
        touch(&data.control_path());
        touch(&tmp.path().join("stale_file_paths"));

        let files = data.completed_files().unwrap();
        assert_eq!(files, vec![data.completed_path(2), data.completed_path(10)]);
    }

    #[test]
    fn test_missing_dir_has_no_files() {
        let tmp = tempfile::tempdir().unwrap();
        let data = GameDataDir::new(tmp.path().join("nope"));
        assert!(data.completed_files().unwrap().is_empty());
    }

    #[test]
    fn test_next_file_id_counts_up() {
        let tmp = tempfile::tempdir().unwrap();
        let data = GameDataDir::new(tmp.path().join("gamedata"));
        assert_eq!(data.next_file_id().unwrap(), 0);
        assert_eq!(data.next_file_id().unwrap(), 1);
        assert_eq!(data.next_file_id().unwrap(), 2);
        assert_eq!(fs::read_to_string(data.control_path()).unwrap(), "3");
    }

    #[test]
    fn test_next_file_id_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let data = GameDataDir::new(tmp.path());
        fs::write(data.control_path(), "twelve").unwrap();
        assert!(matches!(
            data.next_file_id(),
            Err(RecordError::Control { .. })
        ));
    }

    #[test]
    fn test_prune_keeps_newest() {
        let tmp = tempfile::tempdir().unwrap();
        let data = GameDataDir::new(tmp.path());
        for id in 0..5 {
            touch(&data.completed_path(id));
        }
        touch(&data.in_progress_path(5));

        let removed = data.prune(3).unwrap();
        assert_eq!(removed, vec![data.completed_path(0), data.completed_path(1)]);
        assert_eq!(data.completed_files().unwrap().len(), 3);
        assert!(data.in_progress_path(5).exists());
    }

    #[test]
    fn test_concurrent_file_ids_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let data = GameDataDir::new(tmp.path());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let data = data.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| data.next_file_id().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();

        assert_eq!(ids, (0..200).collect::<Vec<_>>());
        assert_eq!(fs::read_to_string(data.control_path()).unwrap(), "200");
    }
}
