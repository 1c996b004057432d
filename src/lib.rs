// Chordforge - Song Search to MIDI Arrangement Pipeline
// Module declarations

pub mod chords;
pub mod config;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod project;
pub mod source;
pub mod storage;
pub mod synth;

pub use chords::{ChordProgression, ChordSymbol, Quality, SongMeta};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{Pipeline, ResultBundle, RunError, Stage};
pub use project::ProjectDescription;
pub use source::{ChordSource, CuratedSource, LiveChordSource};
pub use synth::{BassMode, NoteEvent, VoicingConfig};
