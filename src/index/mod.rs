// Chord index - append-only JSONL collection of arranged progressions
// Consumed by the external dataset browser; ids are monotonic and never reused

pub mod browse;

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use browse::{page_slice, PageState, PageView};

/// Errors from index operations
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One immutable index record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordIndexEntry {
    /// Monotonically assigned id, never reused
    pub id: u64,

    /// Canonical chord display strings, in progression order
    pub chords: Vec<String>,
}

/// Append-only chord index writer
pub struct IndexWriter {
    file_path: PathBuf,
}

impl IndexWriter {
    pub fn new(file_path: PathBuf) -> Self {
        IndexWriter { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Next id: one past the highest id already in the file
    fn next_id(&self) -> Result<u64, IndexError> {
        if !self.file_path.exists() {
            return Ok(0);
        }
        let entries = read_index(&self.file_path)?;
        Ok(entries.iter().map(|e| e.id + 1).max().unwrap_or(0))
    }

    /// Append a new entry, assigning the next monotonic id
    pub fn append(&self, chords: Vec<String>) -> Result<ChordIndexEntry, IndexError> {
        let entry = ChordIndexEntry {
            id: self.next_id()?,
            chords,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        let json = serde_json::to_string(&entry)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;

        Ok(entry)
    }
}

/// Read all index entries from a JSONL file
pub fn read_index(path: &Path) -> Result<Vec<ChordIndexEntry>, IndexError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(line)?);
    }

    Ok(entries)
}
