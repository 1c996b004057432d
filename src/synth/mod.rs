// MIDI Synthesizer - deterministic voicing of chord progressions
// Same progression + same config (including seed) always yields the same
// note events, so regeneration is byte-identical

pub mod midi;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::chords::{ChordProgression, ChordSymbol};
use crate::error::PipelineError;

/// Highest base octave whose voicings stay inside MIDI pitch range
const MAX_BASE_OCTAVE: u8 = 7;

/// How the bass note is realized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BassMode {
    /// Bass note one octave below the root (or the slash bass), on its own channel
    SeparateTrack,

    /// Bass note folded into the chord channel
    Folded,

    /// No bass note
    None,
}

/// Voicing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicingConfig {
    /// Octave the chord root is placed in (C4 = middle C)
    pub base_octave: u8,

    /// Bass note handling
    pub bass: BassMode,

    /// Velocity before jitter (1-127)
    pub base_velocity: u8,

    /// Maximum velocity jitter in either direction
    pub velocity_jitter: u8,

    /// Jitter seed; fixing it makes output reproducible
    pub seed: u64,

    /// MIDI channel for chord notes
    pub chord_channel: u8,

    /// MIDI channel for bass notes (SeparateTrack mode)
    pub bass_channel: u8,
}

impl Default for VoicingConfig {
    fn default() -> Self {
        VoicingConfig {
            base_octave: 4,
            bass: BassMode::SeparateTrack,
            base_velocity: 90,
            velocity_jitter: 6,
            seed: 0,
            chord_channel: 0,
            bass_channel: 1,
        }
    }
}

impl VoicingConfig {
    /// Reject configurations that would produce out-of-range notes
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.base_octave < 1 || self.base_octave > MAX_BASE_OCTAVE {
            return Err(PipelineError::SynthesisConfig(format!(
                "base_octave {} outside 1..={}",
                self.base_octave, MAX_BASE_OCTAVE
            )));
        }
        if self.base_velocity == 0 {
            return Err(PipelineError::SynthesisConfig(
                "base_velocity must be at least 1".to_string(),
            ));
        }
        if self.velocity_jitter >= self.base_velocity {
            return Err(PipelineError::SynthesisConfig(format!(
                "velocity_jitter {} must be below base_velocity {}",
                self.velocity_jitter, self.base_velocity
            )));
        }
        if self.base_velocity as u16 + self.velocity_jitter as u16 > 127 {
            return Err(PipelineError::SynthesisConfig(
                "base_velocity + velocity_jitter exceeds 127".to_string(),
            ));
        }
        if self.chord_channel > 15 || self.bass_channel > 15 {
            return Err(PipelineError::SynthesisConfig(
                "MIDI channels must be 0-15".to_string(),
            ));
        }
        if self.bass == BassMode::SeparateTrack && self.chord_channel == self.bass_channel {
            return Err(PipelineError::SynthesisConfig(
                "separate bass track requires a distinct bass channel".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of notes one chord contributes under this config
    pub fn voicing_size(&self, chord: &ChordSymbol) -> usize {
        let bass = match self.bass {
            BassMode::None => 0,
            _ => 1,
        };
        chord.quality.intervals().len() + bass
    }
}

/// A timed MIDI note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch (0-127)
    pub pitch: u8,

    /// MIDI velocity (1-127)
    pub velocity: u8,

    pub start_seconds: f64,
    pub duration_seconds: f64,
    pub channel: u8,
}

/// Synthesize a chord progression into timed note events.
///
/// Start time = bar * beats_per_bar * 60 / bpm. Each chord sustains to
/// the next chord's bar; the last chord sustains one bar.
pub fn synthesize(
    progression: &ChordProgression,
    config: &VoicingConfig,
) -> Result<Vec<NoteEvent>, PipelineError> {
    config.validate()?;

    let seconds_per_bar = progression.seconds_per_bar();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut notes = Vec::new();

    for (i, chord) in progression.chords.iter().enumerate() {
        let start = chord.bar_position as f64 * seconds_per_bar;

        let duration_bars = match progression.chords.get(i + 1) {
            // A repeated bar position would stall the timeline; treat it as a full bar
            Some(next) => next.bar_position.saturating_sub(chord.bar_position).max(1),
            None => 1,
        };
        let duration = duration_bars as f64 * seconds_per_bar;

        if config.bass != BassMode::None {
            let bass_pc = chord.bass.unwrap_or(chord.root);
            let channel = match config.bass {
                BassMode::SeparateTrack => config.bass_channel,
                _ => config.chord_channel,
            };
            notes.push(NoteEvent {
                pitch: 12 * config.base_octave + bass_pc,
                velocity: jitter_velocity(&mut rng, config),
                start_seconds: start,
                duration_seconds: duration,
                channel,
            });
        }

        for &interval in chord.quality.intervals() {
            notes.push(NoteEvent {
                pitch: 12 * (config.base_octave + 1) + chord.root + interval,
                velocity: jitter_velocity(&mut rng, config),
                start_seconds: start,
                duration_seconds: duration,
                channel: config.chord_channel,
            });
        }
    }

    Ok(notes)
}

fn jitter_velocity(rng: &mut StdRng, config: &VoicingConfig) -> u8 {
    if config.velocity_jitter == 0 {
        return config.base_velocity;
    }
    let jitter = config.velocity_jitter as i32;
    let offset = rng.gen_range(-jitter..=jitter);
    (config.base_velocity as i32 + offset).clamp(1, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chords::{parse, Quality, SongMeta};

    fn fixture() -> ChordProgression {
        let tokens: Vec<String> = ["C", "G", "Am", "F"].iter().map(|s| s.to_string()).collect();
        parse(&tokens, SongMeta::new("Fixture", "Test"), 120.0, 4).unwrap()
    }

    #[test]
    fn test_note_count_matches_voicing_sizes() {
        let progression = fixture();
        let config = VoicingConfig::default();

        let expected: usize = progression
            .chords
            .iter()
            .map(|c| config.voicing_size(c))
            .sum();

        let notes = synthesize(&progression, &config).unwrap();
        assert_eq!(notes.len(), expected);
        // 4 triads + 4 bass notes
        assert_eq!(notes.len(), 16);
    }

    #[test]
    fn test_chord_start_times_at_120_bpm() {
        // 4 beats/bar at 120 BPM = 2 seconds per bar
        let progression = fixture();
        let notes = synthesize(&progression, &VoicingConfig::default()).unwrap();

        let mut starts: Vec<f64> = notes.iter().map(|n| n.start_seconds).collect();
        starts.dedup();
        assert_eq!(starts, vec![0.0, 2.0, 4.0, 6.0]);

        // Every note sustains one bar
        for note in &notes {
            assert!((note.duration_seconds - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_same_seed_is_byte_identical() {
        let progression = fixture();
        let config = VoicingConfig {
            seed: 42,
            ..Default::default()
        };

        let first = synthesize(&progression, &config).unwrap();
        let second = synthesize(&progression, &config).unwrap();
        assert_eq!(first, second);

        let a = serde_json::to_vec(&first).unwrap();
        let b = serde_json::to_vec(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_changes_velocities() {
        let progression = fixture();
        let first = synthesize(
            &progression,
            &VoicingConfig {
                seed: 1,
                ..Default::default()
            },
        )
        .unwrap();
        let second = synthesize(
            &progression,
            &VoicingConfig {
                seed: 2,
                ..Default::default()
            },
        )
        .unwrap();

        let velocities = |notes: &[NoteEvent]| notes.iter().map(|n| n.velocity).collect::<Vec<_>>();
        assert_ne!(velocities(&first), velocities(&second));
    }

    #[test]
    fn test_velocity_stays_in_range() {
        let progression = fixture();
        let config = VoicingConfig {
            base_velocity: 120,
            velocity_jitter: 7,
            ..Default::default()
        };
        for note in synthesize(&progression, &config).unwrap() {
            assert!(note.velocity >= 1 && note.velocity <= 127);
        }
    }

    #[test]
    fn test_voicing_pitches_c_major() {
        let progression = fixture();
        let config = VoicingConfig::default();
        let notes = synthesize(&progression, &config).unwrap();

        // First chord is C major: bass C3 (48), then C4 E4 G4 (60, 64, 67)
        assert_eq!(notes[0].pitch, 48);
        assert_eq!(notes[0].channel, config.bass_channel);
        assert_eq!(notes[1].pitch, 60);
        assert_eq!(notes[2].pitch, 64);
        assert_eq!(notes[3].pitch, 67);
    }

    #[test]
    fn test_slash_bass_overrides_root() {
        let tokens: Vec<String> = ["G/B"].iter().map(|s| s.to_string()).collect();
        let progression = parse(&tokens, SongMeta::default(), 120.0, 4).unwrap();
        assert_eq!(progression.chords[0].quality, Quality::Major);

        let notes = synthesize(&progression, &VoicingConfig::default()).unwrap();
        // Bass is B3 (59), not G3 (55)
        assert_eq!(notes[0].pitch, 59);
    }

    #[test]
    fn test_folded_bass_uses_chord_channel() {
        let progression = fixture();
        let config = VoicingConfig {
            bass: BassMode::Folded,
            ..Default::default()
        };
        let notes = synthesize(&progression, &config).unwrap();
        assert!(notes.iter().all(|n| n.channel == config.chord_channel));
    }

    #[test]
    fn test_no_cross_chord_overlap_per_channel() {
        let progression = fixture();
        let notes = synthesize(&progression, &VoicingConfig::default()).unwrap();

        for a in &notes {
            for b in &notes {
                if a.channel == b.channel && a.start_seconds < b.start_seconds {
                    assert!(a.start_seconds + a.duration_seconds <= b.start_seconds + 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let bad_octave = VoicingConfig {
            base_octave: 9,
            ..Default::default()
        };
        assert!(matches!(
            bad_octave.validate(),
            Err(PipelineError::SynthesisConfig(_))
        ));

        let jitter_too_big = VoicingConfig {
            base_velocity: 5,
            velocity_jitter: 5,
            ..Default::default()
        };
        assert!(jitter_too_big.validate().is_err());

        let clashing_channels = VoicingConfig {
            bass_channel: 0,
            chord_channel: 0,
            ..Default::default()
        };
        assert!(clashing_channels.validate().is_err());

        let hot_velocity = VoicingConfig {
            base_velocity: 125,
            velocity_jitter: 6,
            ..Default::default()
        };
        assert!(hot_velocity.validate().is_err());
    }
}
