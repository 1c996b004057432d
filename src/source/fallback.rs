// Curated fallback source - always-available chord data for well-known songs
// Substituted transparently when the live source cannot serve a query

use crate::chords::SongMeta;

use super::{ChordSource, RawProgression, SearchResult, SourceError};

/// Minimum token-overlap score for a fallback entry to count as a match.
/// Scoring rule: lowercase whitespace tokens, Dice coefficient
/// 2*|shared| / (|query| + |entry|).
const MATCH_THRESHOLD: f64 = 0.5;

/// One curated progression
#[derive(Debug, Clone)]
struct CuratedEntry {
    title: &'static str,
    artist: &'static str,
    tokens: &'static [&'static str],
    tempo_bpm: f64,
    beats_per_bar: u32,
}

/// The curated set. Order matters: ties in match score keep the earlier entry.
const CURATED: &[CuratedEntry] = &[
    CuratedEntry {
        title: "Let It Be",
        artist: "The Beatles",
        tokens: &["C", "G", "Am", "F", "C", "G", "F", "C"],
        tempo_bpm: 72.0,
        beats_per_bar: 4,
    },
    CuratedEntry {
        title: "Wonderwall",
        artist: "Oasis",
        tokens: &["Em", "G", "Dsus4", "Asus4"],
        tempo_bpm: 87.0,
        beats_per_bar: 4,
    },
    CuratedEntry {
        title: "House of the Rising Sun",
        artist: "The Animals",
        tokens: &["Am", "C", "D", "F", "Am", "E", "Am", "E"],
        tempo_bpm: 77.0,
        beats_per_bar: 3,
    },
    CuratedEntry {
        title: "Hallelujah",
        artist: "Leonard Cohen",
        tokens: &["C", "Am", "C", "Am", "F", "G", "C", "G"],
        tempo_bpm: 60.0,
        beats_per_bar: 3,
    },
    CuratedEntry {
        title: "Stand By Me",
        artist: "Ben E. King",
        tokens: &["A", "F#m", "D", "E", "A"],
        tempo_bpm: 118.0,
        beats_per_bar: 4,
    },
    CuratedEntry {
        title: "No Woman No Cry",
        artist: "Bob Marley",
        tokens: &["C", "G/B", "Am", "F", "C", "F", "C", "G"],
        tempo_bpm: 79.0,
        beats_per_bar: 4,
    },
    CuratedEntry {
        title: "Creep",
        artist: "Radiohead",
        tokens: &["G", "B", "C", "Cm"],
        tempo_bpm: 92.0,
        beats_per_bar: 4,
    },
    CuratedEntry {
        title: "Hotel California",
        artist: "Eagles",
        tokens: &["Am", "E", "G", "D", "F", "C", "Dm", "E"],
        tempo_bpm: 74.0,
        beats_per_bar: 4,
    },
];

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

/// Dice coefficient over distinct lowercase tokens
fn match_score(query_tokens: &[String], entry: &CuratedEntry) -> f64 {
    let entry_text = format!("{} {}", entry.artist, entry.title);
    let entry_tokens = tokenize(&entry_text);

    if query_tokens.is_empty() || entry_tokens.is_empty() {
        return 0.0;
    }

    let shared = query_tokens
        .iter()
        .filter(|t| entry_tokens.contains(t))
        .count();

    2.0 * shared as f64 / (query_tokens.len() + entry_tokens.len()) as f64
}

/// Curated fallback chord source
#[derive(Debug, Default)]
pub struct CuratedSource;

impl ChordSource for CuratedSource {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        let query_tokens = tokenize(query);

        let mut scored: Vec<(usize, f64)> = CURATED
            .iter()
            .enumerate()
            .map(|(idx, entry)| (idx, match_score(&query_tokens, entry)))
            .filter(|(_, score)| *score >= MATCH_THRESHOLD)
            .collect();

        // Stable sort keeps curated order on equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (idx, _))| SearchResult {
                source_id: idx.to_string(),
                title: CURATED[idx].title.to_string(),
                artist: CURATED[idx].artist.to_string(),
                relevance_rank: rank as u32,
            })
            .collect())
    }

    async fn fetch(&self, source_id: &str) -> Result<RawProgression, SourceError> {
        let idx: usize = source_id
            .parse()
            .map_err(|_| SourceError::NotFound(source_id.to_string()))?;

        let entry = CURATED
            .get(idx)
            .ok_or_else(|| SourceError::NotFound(source_id.to_string()))?;

        Ok(RawProgression {
            meta: SongMeta::new(entry.title, entry.artist),
            tokens: entry.tokens.iter().map(|t| t.to_string()).collect(),
            tempo_bpm: Some(entry.tempo_bpm),
            beats_per_bar: Some(entry.beats_per_bar),
        })
    }
}
