// Pipeline configuration
// Rate limiting, retry policy, timeouts, and artifact output location

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default minimum delay between live-source requests (milliseconds).
/// Shared across all concurrent runs, not per-run.
pub const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 1000;

/// Default number of fetch attempts before substituting the fallback source
pub const DEFAULT_MAX_FETCH_ATTEMPTS: u32 = 3;

/// Default network timeout per request (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum delay between requests to the live chord source (ms)
    pub min_request_interval_ms: u64,

    /// Attempt ceiling for retryable fetch failures (Timeout, Blocked, ParseFailure)
    pub max_fetch_attempts: u32,

    /// Per-request network timeout (seconds)
    pub request_timeout_secs: u64,

    /// Base URL of the live chord-sharing site API
    pub base_url: String,

    /// Output directory for MIDI files and the chord index.
    /// `None` uses the platform app-data directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            min_request_interval_ms: DEFAULT_MIN_REQUEST_INTERVAL_MS,
            max_fetch_attempts: DEFAULT_MAX_FETCH_ATTEMPTS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            base_url: crate::source::live::DEFAULT_BASE_URL.to_string(),
            output_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Minimum inter-request interval as a Duration
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}
