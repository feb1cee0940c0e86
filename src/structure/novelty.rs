//! Multi-scale checkerboard novelty
//!
//! A Gaussian-tapered checkerboard kernel slid along the main diagonal of the
//! self-similarity matrix responds to the corner between two homogeneous
//! blocks: within-block similarity (same-side quadrants) counts positive,
//! cross-block similarity (opposite quadrants) negative.
//!
//! # Algorithm
//!
//! For every kernel half-width `s`:
//! 1. Offsets `i ∈ [−s, s)`: negative offsets are the past, the rest the
//!    future. `K[i][j] = sign(x_i)·sign(x_j)·g(x_i)·g(x_j)` with
//!    `x = i + 0.5` and `g(x) = exp(−0.5·(x / (s/2))²)`
//! 2. `score[t] = Σ K[i][j]·S[t+i][t+j]`, treating entries outside `S` as 0,
//!    so a peak at `t` marks the edge between frames `t − 1` and `t`
//! 3. Clip negatives, divide by the curve's own maximum
//!
//! The per-scale curves are summed and renormalised to [0, 1].
//!
//! # Reference
//!
//! Foote, J. (2000). Automatic Audio Segmentation Using a Measure of Audio
//! Novelty. *Proc. IEEE International Conference on Multimedia and Expo*.

use super::similarity::SelfSimilarityMatrix;

/// Novelty curve, one value per sync frame, peak-normalised to [0, 1]
pub type NoveltyCurve = Vec<f32>;

/// Build the Gaussian-tapered checkerboard kernel for half-width `size`
///
/// The kernel is `2·size` square; row `a` corresponds to offset `a − size`.
pub fn checkerboard_kernel(size: usize) -> Vec<Vec<f32>> {
    let s = size as isize;
    let sigma = (size as f32 / 2.0).max(0.5);
    let taper: Vec<f32> = (-s..s)
        .map(|n| {
            let x = n as f32 + 0.5;
            x.signum() * (-0.5 * (x / sigma).powi(2)).exp()
        })
        .collect();

    taper
        .iter()
        .map(|gi| taper.iter().map(|gj| gi * gj).collect())
        .collect()
}

/// Novelty for one kernel size, clipped and normalised to its own maximum
pub fn novelty_at_scale(ssm: &SelfSimilarityMatrix, size: usize) -> Vec<f32> {
    let n = ssm.len();
    let kernel = checkerboard_kernel(size);
    let s = size as isize;

    let mut score: Vec<f32> = (0..n as isize)
        .map(|t| {
            let mut acc = 0.0f32;
            for (ki, row) in kernel.iter().enumerate() {
                let i = t + ki as isize - s;
                for (kj, &k) in row.iter().enumerate() {
                    acc += k * ssm.get_padded(i, t + kj as isize - s);
                }
            }
            acc.max(0.0)
        })
        .collect();

    let max = score.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        score.iter_mut().for_each(|v| *v /= max);
    }
    score
}

/// Sum of per-scale novelty curves, renormalised to [0, 1]
///
/// # Arguments
///
/// * `ssm` - Self-similarity matrix
/// * `sizes` - Kernel half-widths in sync frames (default: 16, 32, 64)
pub fn multi_scale_novelty(ssm: &SelfSimilarityMatrix, sizes: &[usize]) -> NoveltyCurve {
    let n = ssm.len();
    let mut novelty = vec![0.0f32; n];
    for &size in sizes.iter().filter(|&&s| s > 0) {
        for (acc, v) in novelty.iter_mut().zip(novelty_at_scale(ssm, size)) {
            *acc += v;
        }
    }

    let max = novelty.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        novelty.iter_mut().for_each(|v| *v /= max);
    }

    log::debug!("Novelty curve: {} frames, {} scales", n, sizes.len());
    novelty
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two homogeneous blocks of `a` and `b` frames with orthogonal features
    fn two_block_ssm(a: usize, b: usize) -> SelfSimilarityMatrix {
        let mut features = vec![vec![1.0, 0.0]; a];
        features.extend(vec![vec![0.0, 1.0]; b]);
        SelfSimilarityMatrix::from_features(&features)
    }

    #[test]
    fn test_kernel_signs() {
        let k = checkerboard_kernel(2);
        assert_eq!(k.len(), 4);
        assert!(k[0][0] > 0.0); // past-past
        assert!(k[3][3] > 0.0); // future-future
        assert!(k[0][3] < 0.0); // past-future
        assert!(k[2][1] < 0.0); // future-past
        let total: f32 = k.iter().flatten().sum();
        assert!(total.abs() < 1e-6);
    }

    #[test]
    fn test_novelty_peaks_at_block_change() {
        let ssm = two_block_ssm(40, 40);
        let nov = multi_scale_novelty(&ssm, &[8, 16]);
        let peak = nov
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 40);
        assert!((nov[peak] - 1.0).abs() < 1e-6);
        assert!(nov.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_homogeneous_has_flat_interior() {
        let ssm = two_block_ssm(60, 0);
        let nov = novelty_at_scale(&ssm, 8);
        // Away from the zero-padded edges there is nothing to detect
        assert!(nov[30].abs() < 1e-4);
    }
}
