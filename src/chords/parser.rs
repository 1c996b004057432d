// Tolerant chord-symbol parser
// Scraped chord sheets are noisy; unrecognized tokens are dropped rather
// than failing the whole progression

use thiserror::Error;

use super::symbol::{ChordProgression, ChordSymbol, Quality, SongMeta};

/// Parse rejected the token stream: fewer than half of the tokens were
/// valid chord symbols, or none were.
#[derive(Debug, Clone, Error)]
#[error("only {valid} of {total} tokens parsed as chords; progression rejected")]
pub struct AllInvalid {
    pub valid: usize,
    pub total: usize,
}

/// Bar lines and section dashes separate chords in scraped sheets;
/// they are not chord tokens and do not count against validity.
fn is_separator(token: &str) -> bool {
    token.chars().all(|c| matches!(c, '|' | '-' | ':')) && !token.is_empty()
}

/// Parse a single chord token into (root, quality, bass).
/// Grammar: root letter A-G, optional accidental (# or b), optional
/// quality suffix, optional /bass.
pub fn parse_token(token: &str) -> Option<(u8, Quality, Option<u8>)> {
    let token = token.trim_matches(|c: char| matches!(c, ',' | '(' | ')' | '.' | ';'));

    let (chord_part, bass_part) = match token.split_once('/') {
        Some((chord, bass)) => (chord, Some(bass)),
        None => (token, None),
    };

    let (root, suffix) = split_pitch_class(chord_part)?;
    let quality = Quality::from_suffix(suffix)?;

    let bass = match bass_part {
        Some(bass) => {
            let (pc, rest) = split_pitch_class(bass)?;
            if !rest.is_empty() {
                return None;
            }
            Some(pc)
        }
        None => None,
    };

    Some((root, quality, bass))
}

/// Split a leading pitch class (letter + optional accidental) off a token,
/// returning (pitch class, remainder). Root letters are uppercase only;
/// lowercase words in scraped text ("verse", "chorus") must not parse.
fn split_pitch_class(s: &str) -> Option<(u8, &str)> {
    let mut chars = s.char_indices();
    let (_, letter) = chars.next()?;

    let base: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    match chars.next() {
        Some((idx, '#')) => Some((((base + 1).rem_euclid(12)) as u8, &s[idx + 1..])),
        Some((idx, 'b')) => Some((((base - 1).rem_euclid(12)) as u8, &s[idx + 1..])),
        Some((idx, _)) => Some((base as u8, &s[idx..])),
        None => Some((base as u8, "")),
    }
}

/// Parse raw chord tokens into a validated progression.
///
/// Unrecognized tokens are skipped. Fails with [`AllInvalid`] only when
/// fewer than half of the (non-separator) tokens parse, or nothing does.
/// Bar positions are assigned by valid-chord index: one chord per bar.
pub fn parse(
    tokens: &[String],
    meta: SongMeta,
    tempo_bpm: f64,
    beats_per_bar: u32,
) -> Result<ChordProgression, AllInvalid> {
    let candidates: Vec<&String> = tokens.iter().filter(|t| !is_separator(t)).collect();
    let total = candidates.len();

    let mut chords = Vec::new();
    for token in candidates {
        if let Some((root, quality, bass)) = parse_token(token) {
            let bar = chords.len() as u32;
            chords.push(ChordSymbol::new(root, quality, bass, bar));
        } else {
            log::debug!("dropping unrecognized chord token: {:?}", token);
        }
    }

    let valid = chords.len();
    if valid == 0 || valid * 2 < total {
        return Err(AllInvalid { valid, total });
    }

    Ok(ChordProgression {
        meta,
        chords,
        tempo_bpm,
        beats_per_bar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_basic_tokens() {
        assert_eq!(parse_token("C"), Some((0, Quality::Major, None)));
        assert_eq!(parse_token("Am"), Some((9, Quality::Minor, None)));
        assert_eq!(parse_token("G7"), Some((7, Quality::Dominant7, None)));
        assert_eq!(parse_token("Cmaj7"), Some((0, Quality::Major7, None)));
        assert_eq!(parse_token("F#m7"), Some((6, Quality::Minor7, None)));
        assert_eq!(parse_token("Bdim"), Some((11, Quality::Diminished, None)));
        assert_eq!(parse_token("Dsus4"), Some((2, Quality::Sus4, None)));
    }

    #[test]
    fn test_parse_accidentals() {
        assert_eq!(parse_token("Bb"), Some((10, Quality::Major, None)));
        assert_eq!(parse_token("Eb"), Some((3, Quality::Major, None)));
        assert_eq!(parse_token("Cb"), Some((11, Quality::Major, None))); // wraps below C
        assert_eq!(parse_token("Absus2"), Some((8, Quality::Sus2, None)));
    }

    #[test]
    fn test_parse_slash_chords() {
        assert_eq!(parse_token("G/B"), Some((7, Quality::Major, Some(11))));
        assert_eq!(parse_token("C/E"), Some((0, Quality::Major, Some(4))));
        assert_eq!(parse_token("Am7/G"), Some((9, Quality::Minor7, Some(7))));
        // Malformed bass rejects the whole token
        assert_eq!(parse_token("C/xyz"), None);
    }

    #[test]
    fn test_reject_noise() {
        assert_eq!(parse_token("verse"), None);
        assert_eq!(parse_token("Chorus"), None);
        assert_eq!(parse_token(""), None);
        assert_eq!(parse_token("H7"), None);
        assert_eq!(parse_token("C13"), None); // outside the quality set
    }

    #[test]
    fn test_parse_all_valid() {
        let progression = parse(
            &tokens(&["C", "G", "Am", "F"]),
            SongMeta::default(),
            120.0,
            4,
        )
        .unwrap();

        assert_eq!(progression.chords.len(), 4);
        assert_eq!(progression.chord_labels(), vec!["C", "G", "Am", "F"]);

        // Bar positions follow valid-chord order
        for (i, chord) in progression.chords.iter().enumerate() {
            assert_eq!(chord.bar_position, i as u32);
        }
    }

    #[test]
    fn test_skip_and_continue_keeps_order() {
        // 4 of 6 valid: above the 50% threshold
        let progression = parse(
            &tokens(&["C", "noise", "G", "??", "Am", "F"]),
            SongMeta::default(),
            90.0,
            4,
        )
        .unwrap();

        assert_eq!(progression.chord_labels(), vec!["C", "G", "Am", "F"]);
        assert_eq!(progression.chords[3].bar_position, 3);
    }

    #[test]
    fn test_separators_do_not_count() {
        // Bar lines stripped before the validity count: 2 of 2 valid
        let progression = parse(
            &tokens(&["|", "C", "|", "G", "|"]),
            SongMeta::default(),
            120.0,
            4,
        )
        .unwrap();
        assert_eq!(progression.chords.len(), 2);
    }

    #[test]
    fn test_below_threshold_fails() {
        let result = parse(
            &tokens(&["C", "nope", "bad", "worse"]),
            SongMeta::default(),
            120.0,
            4,
        );

        let err = result.unwrap_err();
        assert_eq!(err.valid, 1);
        assert_eq!(err.total, 4);
    }

    #[test]
    fn test_exactly_half_passes() {
        let progression = parse(
            &tokens(&["C", "G", "xx", "yy"]),
            SongMeta::default(),
            120.0,
            4,
        )
        .unwrap();
        assert_eq!(progression.chords.len(), 2);
    }

    #[test]
    fn test_empty_fails() {
        let result = parse(&tokens(&[]), SongMeta::default(), 120.0, 4);
        assert!(result.is_err());

        let result = parse(&tokens(&["|", "|"]), SongMeta::default(), 120.0, 4);
        assert!(result.is_err());
    }
}
