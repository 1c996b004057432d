// Chord symbols - canonical structured representation of chords
// Root and bass are pitch classes 0-11, quality is a closed enum with
// data-driven interval tables

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sharp-based pitch class spellings, index = semitones above C
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Display name for a pitch class. Callers guarantee `pc < 12`;
/// out-of-range input is folded back into the octave.
pub fn pitch_class_name(pc: u8) -> &'static str {
    PITCH_CLASS_NAMES[(pc % 12) as usize]
}

/// Chord quality - the closed set of recognized chord types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Major,
    Minor,
    Dominant7,
    Major7,
    Minor7,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
}

impl Quality {
    /// Semitone intervals above the root for this quality
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Quality::Major => &[0, 4, 7],
            Quality::Minor => &[0, 3, 7],
            Quality::Dominant7 => &[0, 4, 7, 10],
            Quality::Major7 => &[0, 4, 7, 11],
            Quality::Minor7 => &[0, 3, 7, 10],
            Quality::Diminished => &[0, 3, 6],
            Quality::Augmented => &[0, 4, 8],
            Quality::Sus2 => &[0, 2, 7],
            Quality::Sus4 => &[0, 5, 7],
        }
    }

    /// Canonical display suffix (e.g. "m7" in "Am7")
    pub fn suffix(&self) -> &'static str {
        match self {
            Quality::Major => "",
            Quality::Minor => "m",
            Quality::Dominant7 => "7",
            Quality::Major7 => "maj7",
            Quality::Minor7 => "m7",
            Quality::Diminished => "dim",
            Quality::Augmented => "aug",
            Quality::Sus2 => "sus2",
            Quality::Sus4 => "sus4",
        }
    }

    /// Match a raw quality suffix, accepting the spellings seen in
    /// scraped chord sheets. Returns `None` for anything else.
    pub fn from_suffix(suffix: &str) -> Option<Quality> {
        match suffix {
            "" => Some(Quality::Major),
            "m" | "min" | "-" => Some(Quality::Minor),
            "7" | "dom7" => Some(Quality::Dominant7),
            "maj7" | "M7" | "Maj7" => Some(Quality::Major7),
            "m7" | "min7" | "-7" => Some(Quality::Minor7),
            "dim" | "o" | "°" => Some(Quality::Diminished),
            "aug" | "+" => Some(Quality::Augmented),
            "sus2" => Some(Quality::Sus2),
            "sus4" | "sus" => Some(Quality::Sus4),
            _ => None,
        }
    }
}

/// Canonical chord symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSymbol {
    /// Root pitch class, 0-11 (C = 0)
    pub root: u8,

    /// Chord quality
    pub quality: Quality,

    /// Slash-chord bass override, 0-11
    pub bass: Option<u8>,

    /// Bar this chord starts on (0-indexed, strictly increasing within a progression)
    pub bar_position: u32,
}

impl ChordSymbol {
    pub fn new(root: u8, quality: Quality, bass: Option<u8>, bar_position: u32) -> Self {
        ChordSymbol {
            root: root % 12,
            quality,
            bass: bass.map(|b| b % 12),
            bar_position,
        }
    }

    /// Canonical display string (e.g. "Cmaj7", "Am", "G/B")
    pub fn display(&self) -> String {
        let mut name = format!("{}{}", pitch_class_name(self.root), self.quality.suffix());
        if let Some(bass) = self.bass {
            name.push('/');
            name.push_str(pitch_class_name(bass));
        }
        name
    }
}

impl fmt::Display for ChordSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Song metadata carried through the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMeta {
    pub title: String,
    pub artist: String,
}

impl SongMeta {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        SongMeta {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

/// A validated chord progression - at least one chord, bar positions
/// strictly increasing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordProgression {
    pub meta: SongMeta,
    pub chords: Vec<ChordSymbol>,
    pub tempo_bpm: f64,
    pub beats_per_bar: u32,
}

impl ChordProgression {
    /// Duration of one bar in seconds
    pub fn seconds_per_bar(&self) -> f64 {
        self.beats_per_bar as f64 * 60.0 / self.tempo_bpm
    }

    /// Canonical display strings for every chord, in order
    pub fn chord_labels(&self) -> Vec<String> {
        self.chords.iter().map(|c| c.display()).collect()
    }
}
