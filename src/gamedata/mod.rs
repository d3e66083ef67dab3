//! The rotating self-play data directory.
//!
//! ```text
//! gamedata/
//!     batch-0000041.tfrecord   completed, trained from
//!     batch-0000042.tfrecord
//!     batch-0000043            in progress, never trained from
//!     control                  id of the next file to start
//! ```
//!
//! At most `max_files` completed files are kept; finishing a file deletes
//! the oldest ones beyond the cap.

mod dir;
mod writer;

pub use dir::{GameDataDir, COMPLETED_SUFFIX, CONTROL_FILE, FILE_PREFIX};
pub use writer::{GameDataWriter, InProgressFile, DEFAULT_MAX_FILES};
