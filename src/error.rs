// Pipeline error taxonomy
// Every run ends in either a complete ResultBundle or exactly one of these

use thiserror::Error;

use crate::chords::parser::AllInvalid;
use crate::index::IndexError;
use crate::source::SourceError;
use crate::storage::StorageError;

/// Errors that can abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Neither the live source nor the curated fallback had the song
    #[error("no chord progression found for \"{0}\"")]
    NotFound(String),

    /// Too few tokens survived chord parsing
    #[error(transparent)]
    AllInvalid(#[from] AllInvalid),

    /// Voicing configuration rejected before synthesis
    #[error("invalid voicing configuration: {0}")]
    SynthesisConfig(String),

    /// Artifact write failed; any files already written for the run are removed
    #[error("artifact write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Storage layer failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Chord index failure
    #[error("chord index error: {0}")]
    Index(#[from] IndexError),

    /// Source-level failure that survived both retry and fallback
    #[error("chord source failed: {0}")]
    Source(#[from] SourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = PipelineError::NotFound("nowhere man".to_string());
        assert!(err.to_string().contains("nowhere man"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn test_all_invalid_conversion() {
        let err: PipelineError = AllInvalid { valid: 1, total: 4 }.into();
        assert!(err.to_string().contains("1 of 4"));
    }
}
