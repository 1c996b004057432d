// Pipeline Orchestrator
// Sequences search -> fetch -> parse -> synthesize -> assemble, applies the
// retry/fallback policy, and yields a complete ResultBundle or one typed error.
// Artifacts touch disk only during Assembling, behind a rollback guard, so a
// run cancelled or failed at any earlier point leaves nothing behind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::chords::{parse, ChordProgression};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::index::{ChordIndexEntry, IndexWriter};
use crate::project::{assemble, ProjectDescription};
use crate::source::{
    fetch_with_retry, ChordSource, CuratedSource, LiveChordSource, RawProgression,
};
use crate::storage::{default_output_dir, RunWorkspace};
use crate::synth::{midi::render_midi, synthesize, NoteEvent, VoicingConfig};

/// Assumed tempo when the source carries no annotation
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Assumed time signature when the source carries no annotation
pub const DEFAULT_BEATS_PER_BAR: u32 = 4;

/// Filename of the per-run MIDI artifact
const MIDI_FILENAME: &str = "arrangement.mid";

/// Filename of the shared chord index
const INDEX_FILENAME: &str = "chord_index.jsonl";

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Searching,
    Fetching,
    Parsing,
    Synthesizing,
    Assembling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Searching => "searching",
            Stage::Fetching => "fetching",
            Stage::Parsing => "parsing",
            Stage::Synthesizing => "synthesizing",
            Stage::Assembling => "assembling",
        };
        write!(f, "{}", name)
    }
}

/// Terminal failure of a run: which stage died, and why
#[derive(Debug, Error)]
#[error("pipeline failed during {stage}: {error}")]
pub struct RunError {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

/// Everything a successful run produces
#[derive(Debug, Clone, Serialize)]
pub struct ResultBundle {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub progression: ChordProgression,
    pub notes: Vec<NoteEvent>,
    pub project: ProjectDescription,
    pub index_entry: ChordIndexEntry,
    pub midi_path: PathBuf,
    pub midi_sha256: String,
}

/// The search-to-arrangement pipeline.
///
/// One instance may serve many concurrent runs; the live source's rate
/// limiter is shared, so the minimum inter-request delay holds globally
/// across runs rather than per-run.
pub struct Pipeline<L, F> {
    live: L,
    fallback: F,
    config: PipelineConfig,
    /// Guards the index's read-max-then-append critical section; concurrent
    /// runs would otherwise mint duplicate ids
    index_lock: tokio::sync::Mutex<()>,
}

impl Pipeline<LiveChordSource, CuratedSource> {
    pub fn new(config: PipelineConfig) -> Self {
        let live = LiveChordSource::new(&config);
        Pipeline {
            live,
            fallback: CuratedSource,
            config,
            index_lock: tokio::sync::Mutex::new(()),
        }
    }
}

impl<L: ChordSource, F: ChordSource> Pipeline<L, F> {
    /// Build a pipeline over explicit source implementations
    pub fn with_sources(live: L, fallback: F, config: PipelineConfig) -> Self {
        Pipeline {
            live,
            fallback,
            config,
            index_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Run the full pipeline for one song query
    pub async fn run(
        &self,
        query: &str,
        voicing: &VoicingConfig,
    ) -> Result<ResultBundle, RunError> {
        let run_id = Uuid::new_v4();
        log::info!("run {}: query {:?}", run_id, query);

        let raw = self.acquire(query).await?;
        log::info!(
            "run {}: acquired {:?} by {:?} ({} tokens)",
            run_id,
            raw.meta.title,
            raw.meta.artist,
            raw.tokens.len()
        );

        let tempo_bpm = raw.tempo_bpm.unwrap_or(DEFAULT_TEMPO_BPM);
        let beats_per_bar = raw.beats_per_bar.unwrap_or(DEFAULT_BEATS_PER_BAR);
        let progression = parse(&raw.tokens, raw.meta.clone(), tempo_bpm, beats_per_bar)
            .map_err(|e| RunError {
                stage: Stage::Parsing,
                error: e.into(),
            })?;
        log::info!(
            "run {}: parsed {} chords at {} BPM",
            run_id,
            progression.chords.len(),
            progression.tempo_bpm
        );

        let notes = synthesize(&progression, voicing).map_err(|error| RunError {
            stage: Stage::Synthesizing,
            error,
        })?;
        log::info!("run {}: synthesized {} notes", run_id, notes.len());

        let bundle = self
            .write_artifacts(run_id, progression, notes, voicing)
            .await
            .map_err(|error| RunError {
                stage: Stage::Assembling,
                error,
            })?;
        log::info!("run {}: done, MIDI at {:?}", run_id, bundle.midi_path);

        Ok(bundle)
    }

    /// Acquire a raw progression: live search + fetch with retry, then the
    /// curated fallback. Later stages never learn which source served it.
    async fn acquire(&self, query: &str) -> Result<RawProgression, RunError> {
        let live_hits = match self.live.search(query).await {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!("live search failed ({}), trying fallback", e);
                Vec::new()
            }
        };

        if let Some(best) = live_hits.first() {
            match fetch_with_retry(&self.live, &best.source_id, self.config.max_fetch_attempts)
                .await
            {
                Ok(raw) => return Ok(raw),
                Err(e) => {
                    log::warn!("live fetch exhausted ({}), substituting fallback", e);
                }
            }
        }

        let fallback_hits = self.fallback.search(query).await.map_err(|e| RunError {
            stage: Stage::Searching,
            error: e.into(),
        })?;

        let best = fallback_hits.first().ok_or_else(|| RunError {
            stage: Stage::Searching,
            error: PipelineError::NotFound(query.to_string()),
        })?;

        self.fallback
            .fetch(&best.source_id)
            .await
            .map_err(|e| RunError {
                stage: Stage::Fetching,
                error: e.into(),
            })
    }

    /// Assembling stage: render MIDI, stage files behind the rollback
    /// guard, append the index entry, then commit.
    async fn write_artifacts(
        &self,
        run_id: Uuid,
        progression: ChordProgression,
        notes: Vec<NoteEvent>,
        voicing: &VoicingConfig,
    ) -> Result<ResultBundle, PipelineError> {
        let output_root = match &self.config.output_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => default_output_dir()?,
        };

        let workspace = RunWorkspace::create(&output_root, &run_id)?;

        let midi_bytes = render_midi(&progression, &notes, voicing)?;
        let (midi_path, midi_sha256) = workspace.stage_file(MIDI_FILENAME, &midi_bytes)?;

        let project = assemble(&progression, &notes, &midi_path, voicing);

        // The index entry is the last write: if it fails, the guard rolls
        // back the MIDI file and the index never saw this run. The lock
        // keeps id assignment atomic across concurrent runs.
        let index_writer = IndexWriter::new(output_root.join(INDEX_FILENAME));
        let index_entry = {
            let _guard = self.index_lock.lock().await;
            index_writer.append(progression.chord_labels())?
        };

        workspace.commit();

        Ok(ResultBundle {
            run_id,
            created_at: Utc::now(),
            progression,
            notes,
            project,
            index_entry,
            midi_path,
            midi_sha256,
        })
    }
}
