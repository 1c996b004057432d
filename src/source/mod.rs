// Chord acquisition - live lookup and curated fallback behind one interface
// The rest of the pipeline never observes which implementation served a query

pub mod fallback;
pub mod live;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::chords::SongMeta;

pub use fallback::CuratedSource;
pub use live::LiveChordSource;

/// Initial backoff delay before the second fetch attempt; doubles per retry
const INITIAL_BACKOFF_MS: u64 = 500;

/// Chord source failures
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// No matching song. Not retried; converts immediately to a fallback lookup.
    #[error("no matching song: {0}")]
    NotFound(String),

    /// The source refused or rate-limited the request
    #[error("source refused the request (status {0})")]
    Blocked(u16),

    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The source responded with something we could not interpret
    #[error("malformed source response: {0}")]
    ParseFailure(String),
}

impl SourceError {
    /// Whether a bounded local retry is worthwhile
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::Blocked(_) | SourceError::Timeout | SourceError::ParseFailure(_)
        )
    }
}

/// One hit from a chord-source search, rank ascending = best match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Source-scoped identifier, valid for `fetch` on the same source
    pub source_id: String,
    pub title: String,
    pub artist: String,
    pub relevance_rank: u32,
}

/// Raw progression as served by a source, before chord parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProgression {
    pub meta: SongMeta,

    /// Chord tokens in sheet order; may contain noise
    pub tokens: Vec<String>,

    /// Tempo annotation, when the source provides one
    pub tempo_bpm: Option<f64>,

    /// Time-signature annotation, when the source provides one
    pub beats_per_bar: Option<u32>,
}

/// A chord source: search for a song, then fetch its progression
#[allow(async_fn_in_trait)]
pub trait ChordSource {
    /// Search for a song. Empty result means the source has no match.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError>;

    /// Fetch the raw progression behind a search result
    async fn fetch(&self, source_id: &str) -> Result<RawProgression, SourceError>;
}

/// Fetch with exponential backoff, up to `max_attempts` tries.
///
/// `NotFound` returns immediately; only retryable failures (Timeout,
/// Blocked, ParseFailure) are tried again.
pub async fn fetch_with_retry<S: ChordSource>(
    source: &S,
    source_id: &str,
    max_attempts: u32,
) -> Result<RawProgression, SourceError> {
    let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
    let mut last_err = SourceError::NotFound(source_id.to_string());

    for attempt in 1..=max_attempts.max(1) {
        match source.fetch(source_id).await {
            Ok(raw) => return Ok(raw),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                log::warn!(
                    "fetch attempt {}/{} failed ({}), retrying in {:?}",
                    attempt,
                    max_attempts,
                    err,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                last_err = err;
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err)
}
