// Artifact storage - output directories, hashed writes, and a cleanup
// guard so a cancelled or failed run leaves nothing on disk

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to get app data directory")]
    NoAppDataDir,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Platform app-data output directory for chordforge
pub fn default_output_dir() -> StorageResult<PathBuf> {
    let data_dir = dirs::data_dir().ok_or(StorageError::NoAppDataDir)?;
    let dir = data_dir.join("chordforge");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// SHA256 hash of data as lowercase hex
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Per-run artifact directory with rollback-on-drop.
///
/// Files staged through the workspace are deleted (along with the run
/// directory) when the workspace is dropped before `commit`. This is what
/// keeps cancellation and write failures free of partial artifacts.
pub struct RunWorkspace {
    dir: PathBuf,
    committed: bool,
}

impl RunWorkspace {
    /// Create the run directory under `output_root/runs/<run_id>`
    pub fn create(output_root: &Path, run_id: &Uuid) -> StorageResult<Self> {
        let dir = output_root.join("runs").join(run_id.to_string());
        fs::create_dir_all(&dir)?;
        Ok(RunWorkspace {
            dir,
            committed: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a file into the workspace, returning its path and SHA256 hash
    pub fn stage_file(&self, filename: &str, data: &[u8]) -> StorageResult<(PathBuf, String)> {
        let file_path = self.dir.join(filename);
        let mut file = fs::File::create(&file_path)?;
        file.write_all(data)?;
        file.flush()?;
        Ok((file_path, calculate_sha256(data)))
    }

    /// Keep the staged files; the guard no longer cleans up on drop
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for RunWorkspace {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_dir_all(&self.dir) {
                log::warn!("failed to clean up run workspace {:?}: {}", self.dir, e);
            }
        }
    }
}
