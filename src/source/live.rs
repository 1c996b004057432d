// Live chord source - JSON API client for a chord-sharing site
// Enforces a global minimum inter-request delay so concurrent runs stay
// a respectful client of the external service

use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::chords::SongMeta;
use crate::config::PipelineConfig;

use super::{ChordSource, RawProgression, SearchResult, SourceError};

pub const DEFAULT_BASE_URL: &str = "https://api.chordsheets.example.com/v1";
const USER_AGENT: &str = "chordforge/0.1.0 (chord arrangement pipeline)";

/// Rate limiter enforcing a minimum delay between requests.
///
/// The lock guards only the elapsed-time check and the timestamp update;
/// it is never held across the network call.
pub(crate) struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub(crate) fn new(min_interval: Duration) -> Self {
        RateLimiter {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait if necessary to comply with the rate limit
    pub(crate) async fn wait(&self) {
        let wait_time = {
            let mut last = self.last_request.lock().await;
            let now = Instant::now();
            let wait = match *last {
                Some(last_time) => {
                    let elapsed = now.duration_since(last_time);
                    self.min_interval.saturating_sub(elapsed)
                }
                None => Duration::ZERO,
            };
            *last = Some(now + wait);
            wait
        };

        if !wait_time.is_zero() {
            log::debug!("rate limiting: waiting {:?}", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    results: Vec<ApiSearchHit>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchHit {
    id: String,
    title: String,
    artist: String,
}

#[derive(Debug, Deserialize)]
struct ApiSheet {
    title: String,
    artist: String,
    /// Sheet body; chords are wrapped in [ch]...[/ch] spans
    content: String,
    tempo_bpm: Option<f64>,
    beats_per_bar: Option<u32>,
}

/// Live chord source backed by a chord-sharing site's JSON API
pub struct LiveChordSource {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    limiter: Arc<RateLimiter>,
}

impl LiveChordSource {
    pub fn new(config: &PipelineConfig) -> Self {
        LiveChordSource {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
            limiter: Arc::new(RateLimiter::new(config.min_request_interval())),
        }
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, SourceError> {
        self.limiter.wait().await;

        let response = self
            .http
            .get(url)
            .query(query)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            // Connection-level failures are transient, same as timeouts
            .map_err(|_| SourceError::Timeout)?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(SourceError::NotFound(url.to_string()));
        }
        if matches!(status.as_u16(), 403 | 429 | 503) {
            return Err(SourceError::Blocked(status.as_u16()));
        }
        if !status.is_success() {
            return Err(SourceError::ParseFailure(format!(
                "unexpected status {}",
                status
            )));
        }

        Ok(response)
    }
}

impl ChordSource for LiveChordSource {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        let url = format!("{}/search", self.base_url);
        log::debug!("searching live source for {:?}", query);

        let response = self.get(&url, &[("q", query)]).await?;
        let parsed: ApiSearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ParseFailure(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| SearchResult {
                source_id: hit.id,
                title: hit.title,
                artist: hit.artist,
                relevance_rank: rank as u32,
            })
            .collect())
    }

    async fn fetch(&self, source_id: &str) -> Result<RawProgression, SourceError> {
        let url = format!("{}/sheets/{}", self.base_url, source_id);

        let response = self.get(&url, &[]).await?;
        let sheet: ApiSheet = response
            .json()
            .await
            .map_err(|e| SourceError::ParseFailure(e.to_string()))?;

        let tokens = extract_chord_tokens(&sheet.content);
        if tokens.is_empty() {
            return Err(SourceError::ParseFailure(format!(
                "sheet {} has no chord content",
                source_id
            )));
        }
        validate_annotations(sheet.tempo_bpm, sheet.beats_per_bar)?;

        log::info!(
            "fetched {:?} by {:?}: {} raw tokens",
            sheet.title,
            sheet.artist,
            tokens.len()
        );

        Ok(RawProgression {
            meta: SongMeta::new(sheet.title, sheet.artist),
            tokens,
            tempo_bpm: sheet.tempo_bpm,
            beats_per_bar: sheet.beats_per_bar,
        })
    }
}

/// Upper bound for a plausible time signature; the MIDI time-signature
/// numerator is a single byte and real sheets never come close
const MAX_BEATS_PER_BAR: u32 = 32;

/// Reject timing annotations that would corrupt downstream bar math.
/// A zero or non-finite tempo turns bar durations into inf/NaN.
fn validate_annotations(
    tempo_bpm: Option<f64>,
    beats_per_bar: Option<u32>,
) -> Result<(), SourceError> {
    if let Some(bpm) = tempo_bpm {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(SourceError::ParseFailure(format!(
                "unusable tempo annotation: {}",
                bpm
            )));
        }
    }
    if let Some(beats) = beats_per_bar {
        if beats == 0 || beats > MAX_BEATS_PER_BAR {
            return Err(SourceError::ParseFailure(format!(
                "unusable time signature annotation: {} beats per bar",
                beats
            )));
        }
    }
    Ok(())
}

/// Pull chord tokens out of a sheet body.
///
/// Sheets mark chords with [ch]...[/ch] spans; when a body carries no
/// spans at all it is treated as a bare token list and whitespace-split.
/// The tolerant parser downstream handles any noise that lets through.
pub fn extract_chord_tokens(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find("[ch]") {
        rest = &rest[start + 4..];
        match rest.find("[/ch]") {
            Some(end) => {
                let token = rest[..end].trim();
                if !token.is_empty() {
                    tokens.push(token.to_string());
                }
                rest = &rest[end + 5..];
            }
            None => break,
        }
    }

    if tokens.is_empty() {
        return content
            .split_whitespace()
            .map(|t| t.to_string())
            .collect();
    }

    tokens
}
