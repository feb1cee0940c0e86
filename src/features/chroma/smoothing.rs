//! Temporal chroma smoothing

/// Smooth chroma vectors over time with a centred moving average
///
/// # Arguments
///
/// * `chroma_vectors` - Vector of 12-element chroma vectors
/// * `window_size` - Smoothing window size in frames (default: 9)
///
/// # Returns
///
/// Smoothed chroma vectors. The window shrinks at the edges rather than
/// padding with zeros.
pub fn smooth_chroma(chroma_vectors: &[Vec<f32>], window_size: usize) -> Vec<Vec<f32>> {
    if window_size <= 1 || chroma_vectors.is_empty() {
        return chroma_vectors.to_vec();
    }
    log::debug!(
        "Smoothing {} chroma vectors with window size {}",
        chroma_vectors.len(),
        window_size
    );

    let n = chroma_vectors.len();
    let dims = chroma_vectors[0].len();
    let half = window_size / 2;

    // Prefix sums per dimension
    let mut prefix = vec![vec![0.0f32; dims]; n + 1];
    for t in 0..n {
        for d in 0..dims {
            prefix[t + 1][d] = prefix[t][d] + chroma_vectors[t][d];
        }
    }

    (0..n)
        .map(|t| {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(n);
            let count = (hi - lo) as f32;
            (0..dims)
                .map(|d| (prefix[hi][d] - prefix[lo][d]) / count)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_spreads_impulse() {
        let mut frames = vec![vec![0.0f32; 12]; 9];
        frames[4][0] = 9.0;
        let smoothed = smooth_chroma(&frames, 3);
        assert!((smoothed[3][0] - 3.0).abs() < 1e-5);
        assert!((smoothed[4][0] - 3.0).abs() < 1e-5);
        assert!((smoothed[5][0] - 3.0).abs() < 1e-5);
        assert_eq!(smoothed[0][0], 0.0);
    }

    #[test]
    fn test_window_one_is_identity() {
        let frames = vec![vec![1.0f32; 12], vec![0.0; 12]];
        assert_eq!(smooth_chroma(&frames, 1), frames);
    }
}
