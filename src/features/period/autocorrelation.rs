//! Autocorrelation-based global tempo estimation
//!
//! Finds the dominant periodicity of the onset strength envelope.
//!
//! # Algorithm
//!
//! 1. Remove the mean of the onset envelope
//! 2. Compute autocorrelation using FFT acceleration: `ACF = IFFT(|FFT(signal)|²)`
//! 3. Weight each lag in the BPM range by a log-normal prior centred on
//!    `prior_bpm` (one octave standard deviation)
//! 4. Take the best weighted lag and refine it by parabolic interpolation
//! 5. Reject the estimate when `ACF[lag] / ACF[0]` is below the pulse
//!    clarity threshold: the signal has no usable beat
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::TempoEstimate;
use crate::error::EngineError;

const EPSILON: f32 = 1e-10;

/// Estimate the global tempo of an onset envelope
///
/// # Arguments
///
/// * `onset_envelope` - Onset strength, one value per frame
/// * `frame_rate` - Onset frames per second (`sample_rate / hop_size`)
/// * `min_bpm` - Minimum BPM to consider (default: 60.0)
/// * `max_bpm` - Maximum BPM to consider (default: 200.0)
/// * `prior_bpm` - Centre of the tempo prior (default: 120.0)
/// * `clarity_threshold` - Minimum normalised autocorrelation (default: 0.1)
///
/// # Returns
///
/// `Ok(None)` when the envelope has no detectable pulse, otherwise the
/// estimated tempo.
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` for a non-positive frame rate or an
/// empty/inverted BPM range.
pub fn estimate_tempo(
    onset_envelope: &[f32],
    frame_rate: f32,
    min_bpm: f32,
    max_bpm: f32,
    prior_bpm: f32,
    clarity_threshold: f32,
) -> Result<Option<TempoEstimate>, EngineError> {
    log::debug!(
        "Estimating tempo: {} onset frames at {:.2} fps, range=[{:.1}, {:.1}] BPM",
        onset_envelope.len(),
        frame_rate,
        min_bpm,
        max_bpm
    );

    if frame_rate <= 0.0 || !frame_rate.is_finite() {
        return Err(EngineError::InvalidInput(format!(
            "Invalid onset frame rate: {}",
            frame_rate
        )));
    }
    if min_bpm <= 0.0 || max_bpm <= 0.0 || min_bpm >= max_bpm {
        return Err(EngineError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            min_bpm, max_bpm
        )));
    }

    let n = onset_envelope.len();
    let lag_min = ((60.0 * frame_rate / max_bpm).floor() as usize).max(1);
    let lag_max = (60.0 * frame_rate / min_bpm).ceil() as usize;

    // Need at least two full periods of the slowest tempo
    if n < 2 * lag_max.max(2) {
        log::debug!("Onset envelope too short for tempo estimation ({} frames)", n);
        return Ok(None);
    }

    // Step 1: Mean removal
    let mean = onset_envelope.iter().sum::<f32>() / n as f32;
    let centred: Vec<f32> = onset_envelope.iter().map(|&x| x - mean).collect();

    // Step 2: Autocorrelation
    let acf = compute_autocorrelation_fft(&centred);
    if acf[0] <= EPSILON {
        log::debug!("Flat onset envelope, no tempo");
        return Ok(None);
    }

    // Step 3: Prior-weighted lag search
    let upper = lag_max.min(n - 2);
    let mut best_lag = 0usize;
    let mut best_score = f32::NEG_INFINITY;
    for lag in lag_min..=upper {
        let bpm = 60.0 * frame_rate / lag as f32;
        let score = acf[lag] * tempo_prior(bpm, prior_bpm);
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        return Ok(None);
    }

    // Step 4: Clarity gate
    let clarity = acf[best_lag] / acf[0];
    if clarity < clarity_threshold {
        log::debug!(
            "Pulse clarity {:.3} below threshold {:.3}, no tempo",
            clarity,
            clarity_threshold
        );
        return Ok(None);
    }

    // Step 5: Parabolic refinement
    let period = refine_lag(&acf, best_lag);
    let bpm = 60.0 * frame_rate / period;

    log::debug!(
        "Tempo estimate: {:.2} BPM (lag {:.2} frames, clarity {:.3})",
        bpm,
        period,
        clarity
    );

    Ok(Some(TempoEstimate {
        bpm,
        period_frames: period,
        clarity: clarity.clamp(0.0, 1.0),
    }))
}

/// Log-normal tempo prior, one octave standard deviation
fn tempo_prior(bpm: f32, prior_bpm: f32) -> f32 {
    let octaves = (bpm / prior_bpm.max(EPSILON)).log2();
    (-0.5 * octaves * octaves).exp()
}

/// Sub-frame lag by fitting a parabola through the peak and its neighbours
fn refine_lag(acf: &[f32], lag: usize) -> f32 {
    if lag == 0 || lag + 1 >= acf.len() {
        return lag as f32;
    }
    let (a, b, c) = (acf[lag - 1], acf[lag], acf[lag + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < EPSILON {
        return lag as f32;
    }
    let offset = (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
    lag as f32 + offset
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity: ACF = IFFT(|FFT(signal)|²), zero-padded so the result
/// is linear (not circular) correlation.
pub(crate) fn compute_autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return vec![];
    }

    let fft_size = (2 * n).next_power_of_two();
    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for x in buffer.iter_mut() {
        *x = Complex::new(x.norm_sqr(), 0.0);
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    buffer[..n].iter().map(|x| x.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Impulse train with one onset every `period` frames
    fn generate_pulse_envelope(n: usize, period: usize) -> Vec<f32> {
        (0..n).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_autocorrelation_matches_direct_sum() {
        let signal = vec![1.0f32, -2.0, 0.5, 3.0, -1.0];
        let acf = compute_autocorrelation_fft(&signal);
        for lag in 0..signal.len() {
            let direct: f32 = (0..signal.len() - lag)
                .map(|i| signal[i] * signal[i + lag])
                .sum();
            assert!((acf[lag] - direct).abs() < 1e-4, "lag {}", lag);
        }
    }

    #[test]
    fn test_estimate_tempo_120bpm() {
        // 22050 / 512 = 43.07 fps, 120 BPM = 21.5 frames; use 22 frames
        let frame_rate = 22050.0 / 512.0;
        let env = generate_pulse_envelope(1000, 22);
        let tempo = estimate_tempo(&env, frame_rate, 60.0, 200.0, 120.0, 0.1)
            .unwrap()
            .expect("pulse train has a tempo");
        let expected = 60.0 * frame_rate / 22.0;
        assert!(
            (tempo.bpm - expected).abs() < 2.0,
            "expected ~{:.1}, got {:.1}",
            expected,
            tempo.bpm
        );
        assert!(tempo.clarity > 0.5);
    }

    #[test]
    fn test_flat_envelope_has_no_tempo() {
        let env = vec![0.3f32; 800];
        let tempo = estimate_tempo(&env, 43.0, 60.0, 200.0, 120.0, 0.1).unwrap();
        assert!(tempo.is_none());
    }

    #[test]
    fn test_sparse_events_have_no_tempo() {
        // Three isolated events tens of seconds apart
        let mut env = vec![0.0f32; 4000];
        env[1000] = 5.0;
        env[2000] = 5.0;
        env[3000] = 5.0;
        let tempo = estimate_tempo(&env, 43.0, 60.0, 200.0, 120.0, 0.1).unwrap();
        assert!(tempo.is_none());
    }

    #[test]
    fn test_invalid_range() {
        assert!(estimate_tempo(&[0.0; 10], 43.0, 200.0, 60.0, 120.0, 0.1).is_err());
    }
}
