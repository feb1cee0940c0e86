//! Mel-frequency cepstral coefficients and their time derivatives

use std::f32::consts::PI;

/// Half-width of the regression window used for deltas
const DELTA_HALF_WIDTH: usize = 4;

/// Orthonormal DCT-II of log-mel frames, keeping the first `n_mfcc` coefficients
///
/// # Arguments
///
/// * `log_mel` - Log-mel frames (`[frame][band]`, decibels)
/// * `n_mfcc` - Number of coefficients to keep (default: 20)
///
/// # Returns
///
/// MFCC frames (`[frame][coefficient]`)
pub fn mfcc(log_mel: &[Vec<f32>], n_mfcc: usize) -> Vec<Vec<f32>> {
    let n_mels = log_mel.first().map(|f| f.len()).unwrap_or(0);
    if n_mels == 0 {
        return vec![vec![]; log_mel.len()];
    }
    let n_coeffs = n_mfcc.min(n_mels);

    // DCT basis, rows = coefficients
    let scale0 = (1.0 / n_mels as f32).sqrt();
    let scale = (2.0 / n_mels as f32).sqrt();
    let basis: Vec<Vec<f32>> = (0..n_coeffs)
        .map(|k| {
            let s = if k == 0 { scale0 } else { scale };
            (0..n_mels)
                .map(|n| s * (PI * k as f32 * (2 * n + 1) as f32 / (2 * n_mels) as f32).cos())
                .collect()
        })
        .collect();

    log_mel
        .iter()
        .map(|frame| {
            basis
                .iter()
                .map(|row| row.iter().zip(frame.iter()).map(|(b, x)| b * x).sum())
                .collect()
        })
        .collect()
}

/// Regression delta along time, clamping indices at the edges
///
/// `d[t] = Σ n·(x[t+n] − x[t−n]) / (2·Σ n²)` for `n = 1..=4`.
pub fn delta(frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n_frames = frames.len();
    if n_frames == 0 {
        return vec![];
    }
    let dims = frames[0].len();
    let denom: f32 = 2.0 * (1..=DELTA_HALF_WIDTH).map(|n| (n * n) as f32).sum::<f32>();
    let last = n_frames - 1;

    (0..n_frames)
        .map(|t| {
            (0..dims)
                .map(|d| {
                    let mut acc = 0.0f32;
                    for n in 1..=DELTA_HALF_WIDTH {
                        let ahead = frames[(t + n).min(last)][d];
                        let behind = frames[t.saturating_sub(n)][d];
                        acc += n as f32 * (ahead - behind);
                    }
                    acc / denom
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_log_mel_has_only_c0() {
        let frames = vec![vec![3.0f32; 64]; 4];
        let coeffs = mfcc(&frames, 20);
        assert_eq!(coeffs[0].len(), 20);
        assert!((coeffs[0][0] - 3.0 * 64f32.sqrt()).abs() < 1e-3);
        for c in &coeffs[0][1..] {
            assert!(c.abs() < 1e-3);
        }
    }

    #[test]
    fn test_delta_of_linear_ramp_is_slope() {
        let frames: Vec<Vec<f32>> = (0..20).map(|t| vec![2.0 * t as f32]).collect();
        let d = delta(&frames);
        // Away from the clamped edges the slope is recovered exactly
        assert!((d[10][0] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_delta_of_constant_is_zero() {
        let frames = vec![vec![1.0f32, -1.0]; 7];
        for row in delta(&frames) {
            assert!(row.iter().all(|v| v.abs() < 1e-6));
        }
    }
}
