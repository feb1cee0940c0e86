//! Key clarity scoring
//!
//! Estimates how "tonal" vs "atonal" a track is.

use crate::analysis::result::Key;

/// Compute key clarity from key scores
///
/// Clarity is the winning correlation minus the mean of all correlations:
/// a clearly tonal profile has one key standing out, an ambiguous one scores
/// every key about the same.
///
/// # Arguments
///
/// * `scores` - All 24 key scores (any order)
///
/// # Returns
///
/// Clarity score (0.0-1.0), higher = more tonal
pub fn compute_key_clarity(scores: &[(Key, f32)]) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }
    let best = scores
        .iter()
        .map(|(_, s)| *s)
        .fold(f32::NEG_INFINITY, f32::max);
    let mean = scores.iter().map(|(_, s)| *s).sum::<f32>() / scores.len() as f32;
    (best - mean).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_scores_have_zero_clarity() {
        let scores: Vec<(Key, f32)> = (0..12).map(|i| (Key::Major(i), 0.3)).collect();
        assert_eq!(compute_key_clarity(&scores), 0.0);
    }

    #[test]
    fn test_standout_key_is_clear() {
        let mut scores: Vec<(Key, f32)> = (0..12).map(|i| (Key::Minor(i), 0.0)).collect();
        scores[4].1 = 0.9;
        assert!(compute_key_clarity(&scores) > 0.8);
    }
}
