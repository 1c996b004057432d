// MIDI file rendering via the midly crate
// One meta track (tempo, time signature, chord markers) plus one track
// per used channel

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

use crate::chords::ChordProgression;

use super::{NoteEvent, VoicingConfig};

/// Pulses per quarter note. 480 gives sub-millisecond resolution at
/// ordinary tempos.
const PPQ: u16 = 480;

/// Render a progression and its note events into Standard MIDI File bytes.
/// Track roles come from the voicing's channel assignments, not from the
/// notes themselves.
pub fn render_midi(
    progression: &ChordProgression,
    notes: &[NoteEvent],
    voicing: &VoicingConfig,
) -> std::io::Result<Vec<u8>> {
    let header = Header {
        format: Format::Parallel,
        timing: Timing::Metrical(PPQ.into()),
    };

    let ticks_per_second = ticks_per_second(progression.tempo_bpm);
    let labels = progression.chord_labels();

    let mut tracks = Vec::new();
    tracks.push(meta_track(progression, &labels, ticks_per_second));
    tracks.push(channel_track(
        "CHORDS",
        voicing.chord_channel,
        notes,
        ticks_per_second,
    ));

    let has_bass = voicing.bass_channel != voicing.chord_channel
        && notes.iter().any(|n| n.channel == voicing.bass_channel);
    if has_bass {
        tracks.push(channel_track(
            "BASS",
            voicing.bass_channel,
            notes,
            ticks_per_second,
        ));
    }

    let smf = Smf { header, tracks };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

fn ticks_per_second(bpm: f64) -> f64 {
    PPQ as f64 * bpm / 60.0
}

fn to_tick(seconds: f64, ticks_per_second: f64) -> u32 {
    (seconds * ticks_per_second).round() as u32
}

/// Tempo, time signature, and one marker per chord boundary
fn meta_track<'a>(
    progression: &ChordProgression,
    labels: &'a [String],
    ticks_per_second: f64,
) -> Track<'a> {
    let mut events: Vec<(u32, TrackEventKind<'a>)> = Vec::new();

    events.push((0, TrackEventKind::Meta(MetaMessage::TrackName(b"META"))));

    let us_per_quarter = (60_000_000.0 / progression.tempo_bpm) as u32;
    events.push((
        0,
        TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter.into())),
    ));

    // denominator 2 = 2^2 = quarter-note beat unit
    events.push((
        0,
        TrackEventKind::Meta(MetaMessage::TimeSignature(
            progression.beats_per_bar as u8,
            2,
            24,
            8,
        )),
    ));

    let seconds_per_bar = progression.seconds_per_bar();
    for (chord, label) in progression.chords.iter().zip(labels) {
        let tick = to_tick(chord.bar_position as f64 * seconds_per_bar, ticks_per_second);
        events.push((
            tick,
            TrackEventKind::Meta(MetaMessage::Marker(label.as_bytes())),
        ));
    }

    finish_track(events)
}

/// All note on/off events for one channel
fn channel_track<'a>(
    name: &'a str,
    channel: u8,
    notes: &[NoteEvent],
    ticks_per_second: f64,
) -> Track<'a> {
    let mut events: Vec<(u32, TrackEventKind<'a>)> = Vec::new();

    events.push((
        0,
        TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    ));

    for note in notes.iter().filter(|n| n.channel == channel) {
        let tick_on = to_tick(note.start_seconds, ticks_per_second);
        let tick_off = to_tick(note.start_seconds + note.duration_seconds, ticks_per_second);

        events.push((
            tick_on,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOn {
                    key: note.pitch.into(),
                    vel: note.velocity.into(),
                },
            },
        ));
        events.push((
            tick_off,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOff {
                    key: note.pitch.into(),
                    vel: 0.into(),
                },
            },
        ));
    }

    finish_track(events)
}

/// Sort by absolute tick, convert to deltas, close the track
fn finish_track(mut events: Vec<(u32, TrackEventKind)>) -> Track {
    events.sort_by_key(|(tick, _)| *tick);

    let mut track = Track::new();
    let mut last_tick = 0;
    for (tick, kind) in events {
        let delta = tick.saturating_sub(last_tick);
        track.push(TrackEvent {
            delta: delta.into(),
            kind,
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    track
}
