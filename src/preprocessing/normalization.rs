//! Gain utilities: peak measurement, peak-ceiling normalization and linear fades
//!
//! # Example
//!
//! ```
//! use mixgrid_dsp::preprocessing::normalization::apply_peak_ceiling;
//!
//! let mut samples = vec![0.5f32, -1.5, 0.25];
//! let gain = apply_peak_ceiling(&mut samples, 0.99);
//! assert!((samples[1] + 0.99).abs() < 1e-6);
//! assert!(gain < 1.0);
//! ```

/// Largest absolute sample value
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// Scale samples down so the peak equals `ceiling`, if it currently exceeds it
///
/// Never scales up.
///
/// # Returns
///
/// The gain that was applied (1.0 when the buffer was left untouched)
pub fn apply_peak_ceiling(samples: &mut [f32], ceiling: f32) -> f32 {
    let current = peak(samples);
    if current <= ceiling || current <= 0.0 {
        return 1.0;
    }
    let gain = ceiling / current;
    for s in samples.iter_mut() {
        *s *= gain;
    }
    log::debug!(
        "Peak {:.4} above ceiling {:.2}, applied gain {:.4}",
        current,
        ceiling,
        gain
    );
    gain
}

/// `n` evenly spaced weights from 0.0 to 1.0 inclusive
///
/// A single-point ramp is `[1.0]` so a one-sample fade lets the incoming
/// signal through at full level.
pub fn linear_ramp(n: usize) -> Vec<f32> {
    match n {
        0 => vec![],
        1 => vec![1.0],
        _ => {
            let denom = (n - 1) as f32;
            (0..n).map(|i| i as f32 / denom).collect()
        }
    }
}

/// Apply a linear 1.0 -> 0.0 fade over the last `fade_frames` frames of an
/// interleaved buffer, each channel independently
pub fn fade_out_tail(samples: &mut [f32], channels: usize, fade_frames: usize) {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    let n = fade_frames.min(frames);
    if n == 0 {
        return;
    }
    let start = frames - n;
    let ramp = linear_ramp(n);
    for (i, w) in ramp.iter().rev().enumerate() {
        let frame = start + i;
        for ch in 0..channels {
            samples[frame * channels + ch] *= w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_ceiling_only_scales_down() {
        let mut quiet = vec![0.1f32, -0.5, 0.3];
        let gain = apply_peak_ceiling(&mut quiet, 0.99);
        assert_eq!(gain, 1.0);
        assert_eq!(quiet, vec![0.1, -0.5, 0.3]);

        let mut loud = vec![0.2f32, -2.0, 1.0];
        apply_peak_ceiling(&mut loud, 0.99);
        assert!((peak(&loud) - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_linear_ramp() {
        assert_eq!(linear_ramp(0), Vec::<f32>::new());
        assert_eq!(linear_ramp(1), vec![1.0]);
        assert_eq!(linear_ramp(3), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_fade_out_tail_stereo() {
        let mut samples = vec![1.0f32; 8]; // 4 stereo frames
        fade_out_tail(&mut samples, 2, 3);
        assert_eq!(&samples[0..2], &[1.0, 1.0]);
        assert_eq!(&samples[2..4], &[1.0, 1.0]);
        assert_eq!(&samples[4..6], &[0.5, 0.5]);
        assert_eq!(&samples[6..8], &[0.0, 0.0]);
    }
}
