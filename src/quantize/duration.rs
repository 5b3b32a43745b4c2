//! Duration quantization: measured length → notated value

use super::config::TieBreak;
use crate::models::duration::to_f64;
use crate::models::Duration;

/// Differences closer than this count as equidistant
const TIE_EPSILON: f64 = 1e-9;

/// Length of `[start, end)` in quarter notes
pub fn raw_duration(start: f64, end: f64, quarter_duration: f64) -> f64 {
    (end - start) / quarter_duration
}

/// Snap a raw quarter-note length to the nearest vocabulary entry
///
/// Raw lengths below `min_duration` are raised to it first. Equidistant
/// candidates are resolved by `tie_break`. An empty vocabulary yields
/// `min_duration`.
pub fn quantize_duration(
    raw_quarters: f64,
    vocabulary: &[Duration],
    min_duration: Duration,
    tie_break: TieBreak,
) -> Duration {
    let target = raw_quarters.max(to_f64(min_duration));

    let mut best: Option<(Duration, f64)> = None;
    for &candidate in vocabulary {
        let diff = (to_f64(candidate) - target).abs();
        best = match best {
            None => Some((candidate, diff)),
            Some((current, current_diff)) => {
                if diff < current_diff - TIE_EPSILON {
                    Some((candidate, diff))
                } else if (diff - current_diff).abs() <= TIE_EPSILON && wins_tie(candidate, current, tie_break) {
                    Some((candidate, diff))
                } else {
                    Some((current, current_diff))
                }
            }
        };
    }

    match best {
        Some((value, _)) => value,
        None => {
            log::warn!("quantize: empty vocabulary, using minimum duration");
            min_duration
        }
    }
}

fn wins_tie(candidate: Duration, current: Duration, tie_break: TieBreak) -> bool {
    match tie_break {
        TieBreak::PreferLonger => candidate > current,
        TieBreak::PreferShorter => candidate < current,
        TieBreak::VocabularyOrder => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::{dotted_vocabulary, quarters, standard_vocabulary};

    fn q(raw: f64) -> Duration {
        quantize_duration(raw, &standard_vocabulary(), quarters(1, 16), TieBreak::PreferLonger)
    }

    #[test]
    fn test_nearest_entry() {
        assert_eq!(q(1.0), quarters(1, 1));
        assert_eq!(q(0.9), quarters(1, 1));
        assert_eq!(q(0.3), quarters(1, 4));
        assert_eq!(q(3.2), quarters(4, 1));
        assert_eq!(q(12.0), quarters(4, 1));
    }

    #[test]
    fn test_floor_clamp() {
        assert_eq!(q(0.0), quarters(1, 8));
        assert_eq!(q(-1.0), quarters(1, 8));
    }

    #[test]
    fn test_tie_break_policies() {
        // 1.5 is equidistant from 1 and 2
        let vocab = standard_vocabulary();
        let min = quarters(1, 16);
        assert_eq!(quantize_duration(1.5, &vocab, min, TieBreak::PreferLonger), quarters(2, 1));
        assert_eq!(quantize_duration(1.5, &vocab, min, TieBreak::PreferShorter), quarters(1, 1));
        // Vocabulary lists 2 before 1
        assert_eq!(quantize_duration(1.5, &vocab, min, TieBreak::VocabularyOrder), quarters(2, 1));
        let reversed: Vec<Duration> = vocab.iter().rev().copied().collect();
        assert_eq!(quantize_duration(1.5, &reversed, min, TieBreak::VocabularyOrder), quarters(1, 1));
    }

    #[test]
    fn test_dotted_vocabulary() {
        let vocab = dotted_vocabulary();
        let min = quarters(1, 16);
        assert_eq!(quantize_duration(1.45, &vocab, min, TieBreak::PreferLonger), quarters(3, 2));
        assert_eq!(quantize_duration(0.8, &vocab, min, TieBreak::PreferLonger), quarters(3, 4));
    }

    #[test]
    fn test_result_is_nearest() {
        let vocab = standard_vocabulary();
        let mut raw = 0.0;
        while raw < 6.0 {
            let chosen = q(raw);
            assert!(vocab.contains(&chosen));
            let target = raw.max(1.0 / 16.0);
            for v in &vocab {
                assert!(
                    (to_f64(chosen) - target).abs() <= (to_f64(*v) - target).abs() + 1e-9,
                    "raw {} chose {} but {} is nearer",
                    raw,
                    chosen,
                    v
                );
            }
            raw += 0.037;
        }
    }

    #[test]
    fn test_empty_vocabulary_falls_back() {
        assert_eq!(
            quantize_duration(1.0, &[], quarters(1, 16), TieBreak::PreferLonger),
            quarters(1, 16)
        );
    }

    #[test]
    fn test_raw_duration() {
        assert_eq!(raw_duration(0.0, 0.5, 0.5), 1.0);
        assert_eq!(raw_duration(1.0, 1.25, 0.5), 0.5);
    }
}
