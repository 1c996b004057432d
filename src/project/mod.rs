// Project Assembler - abstract DAW project description
// Purely derived from its inputs; a DAW-specific serializer renders this
// into actual automation-script text elsewhere

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chords::ChordProgression;
use crate::synth::{BassMode, NoteEvent, VoicingConfig};

/// What a track holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    Chord,
    Bass,
    Marker,
}

/// One track in the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDesc {
    pub name: String,
    pub role: TrackRole,
}

/// A labeled timeline point at a chord boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub time_seconds: f64,
    pub label: String,
}

/// Abstract project description, ready for DAW-side rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDescription {
    pub tracks: Vec<TrackDesc>,
    pub markers: Vec<Marker>,
    pub tempo_bpm: f64,
    pub referenced_midi_file: PathBuf,
}

/// Assemble the project description for a synthesized progression.
///
/// One marker per chord boundary, labeled with the chord's canonical
/// display string. Three tracks (chord, bass, marker) unless the voicing
/// folds bass into the chord track or omits it.
pub fn assemble(
    progression: &ChordProgression,
    notes: &[NoteEvent],
    midi_file: &Path,
    voicing: &VoicingConfig,
) -> ProjectDescription {
    let seconds_per_bar = progression.seconds_per_bar();

    let markers = progression
        .chords
        .iter()
        .map(|chord| Marker {
            time_seconds: chord.bar_position as f64 * seconds_per_bar,
            label: chord.display(),
        })
        .collect();

    let mut tracks = vec![TrackDesc {
        name: "CHORDS".to_string(),
        role: TrackRole::Chord,
    }];

    let has_bass_channel = voicing.bass == BassMode::SeparateTrack
        && notes.iter().any(|n| n.channel == voicing.bass_channel);
    if has_bass_channel {
        tracks.push(TrackDesc {
            name: "BASS".to_string(),
            role: TrackRole::Bass,
        });
    }

    tracks.push(TrackDesc {
        name: "MARKERS".to_string(),
        role: TrackRole::Marker,
    });

    ProjectDescription {
        tracks,
        markers,
        tempo_bpm: progression.tempo_bpm,
        referenced_midi_file: midi_file.to_path_buf(),
    }
}
