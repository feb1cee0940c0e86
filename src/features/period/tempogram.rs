//! Local autocorrelation tempogram
//!
//! Describes the rhythmic texture around every onset frame: for each frame a
//! Hann-windowed neighbourhood of the onset envelope is autocorrelated and
//! the lags `0..win_length` are kept, normalised by lag 0. Sections with
//! different grooves produce visibly different tempogram columns even when
//! their global tempo is the same.

use super::autocorrelation::compute_autocorrelation_fft;
use crate::features::spectral::stft::hann_window;

const EPSILON: f32 = 1e-10;

/// Compute the autocorrelation tempogram
///
/// # Arguments
///
/// * `onset_envelope` - Onset strength, one value per frame
/// * `win_length` - Window length in onset frames (default: 128)
///
/// # Returns
///
/// One `win_length`-dimensional vector per onset frame. Frames whose
/// neighbourhood has no energy are all zeros.
pub fn compute_tempogram(onset_envelope: &[f32], win_length: usize) -> Vec<Vec<f32>> {
    let n = onset_envelope.len();
    if n == 0 || win_length == 0 {
        return vec![vec![]; n];
    }

    let window = hann_window(win_length);
    let half = win_length / 2;
    let mut tempogram = Vec::with_capacity(n);
    let mut frame = vec![0.0f32; win_length];

    for t in 0..n {
        for (i, (slot, &w)) in frame.iter_mut().zip(window.iter()).enumerate() {
            let idx = t as isize - half as isize + i as isize;
            let v = if idx >= 0 && (idx as usize) < n {
                onset_envelope[idx as usize]
            } else {
                0.0
            };
            *slot = v * w;
        }

        let acf = compute_autocorrelation_fft(&frame);
        let norm = acf[0];
        if norm <= EPSILON {
            tempogram.push(vec![0.0; win_length]);
        } else {
            tempogram.push(acf.iter().map(|&v| v / norm).collect());
        }
    }

    log::debug!(
        "Tempogram: {} frames x {} lags",
        tempogram.len(),
        win_length
    );
    tempogram
}
