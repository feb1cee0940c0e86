//! In-process phase vocoder time-stretch and pitch-shift
//!
//! Lower fidelity than a dedicated processor but always available.
//!
//! # Algorithm
//!
//! 1. Time-stretch each channel by `p / r` (Hann-windowed STFT, analysis
//!    hop `Ha`, synthesis hop `Hs = round(Ha · p / r)`, per-bin phase
//!    advance from the wrapped deviation to the expected advance)
//! 2. Resample the stretched channel to `round(frames / r)` with cubic
//!    interpolation, which raises the pitch by `p` and leaves the tempo
//!    change at `r`
//!
//! where `r` is the tempo ratio and `p = 2^(semitones/12)`.

use std::f32::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use super::stretch::StretchStrategy;
use crate::error::EngineError;
use crate::io::AudioBuffer;
use crate::preprocessing::resample::resample_cubic;

const TWO_PI: f32 = 2.0 * PI;

/// Largest per-channel length change, above a four-octave shift at the
/// slowest tempo ratio
const MAX_STRETCH_FACTOR: f64 = 2048.0;

/// Wrap a phase value to [-PI, PI]
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let p = phase + PI;
    p - (p / TWO_PI).floor() * TWO_PI - PI
}

/// Time-stretch one channel so its length is multiplied by `stretch`
///
/// The output length is exactly `round(input.len() · stretch)`.
pub fn stretch_channel(input: &[f32], stretch: f64, fft_size: usize, hop_analysis: usize) -> Vec<f32> {
    let target_len = (input.len() as f64 * stretch).round() as usize;
    if input.is_empty() || target_len == 0 {
        return vec![0.0; target_len];
    }

    let hop_synthesis = ((hop_analysis as f64 * stretch).round() as usize).max(1);
    let num_bins = fft_size / 2 + 1;

    // Periodic Hann
    let window: Vec<f32> = (0..fft_size)
        .map(|i| 0.5 - 0.5 * (TWO_PI * i as f32 / fft_size as f32).cos())
        .collect();
    let expected_advance: Vec<f32> = (0..num_bins)
        .map(|bin| TWO_PI * bin as f32 * hop_analysis as f32 / fft_size as f32)
        .collect();

    // Pad so every input sample lies under a full window
    let mut padded = vec![0.0f32; fft_size / 2];
    padded.extend_from_slice(input);
    padded.resize(padded.len() + fft_size, 0.0);
    let num_frames = (padded.len() - fft_size) / hop_analysis + 1;
    let output_len = (num_frames - 1) * hop_synthesis + fft_size;

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(fft_size);
    let inverse = planner.plan_fft_inverse(fft_size);

    let mut output = vec![0.0f32; output_len];
    let mut window_sum = vec![0.0f32; output_len];
    let mut buffer = vec![Complex::new(0.0f32, 0.0); fft_size];
    let mut prev_phase = vec![0.0f32; num_bins];
    let mut phase_accum = vec![0.0f32; num_bins];
    let hop_ratio = hop_synthesis as f32 / hop_analysis as f32;
    let norm = 1.0 / fft_size as f32;

    for frame in 0..num_frames {
        let analysis_pos = frame * hop_analysis;
        let synthesis_pos = frame * hop_synthesis;

        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(padded[analysis_pos + i] * window[i], 0.0);
        }
        forward.process(&mut buffer);

        for bin in 0..num_bins {
            let c = buffer[bin];
            let magnitude = c.norm();
            let phase = c.arg();
            if frame == 0 {
                phase_accum[bin] = phase;
            } else {
                let deviation = wrap_phase(phase - prev_phase[bin] - expected_advance[bin]);
                phase_accum[bin] += (expected_advance[bin] + deviation) * hop_ratio;
            }
            prev_phase[bin] = phase;
            buffer[bin] = Complex::from_polar(magnitude, phase_accum[bin]);
        }
        for bin in 1..num_bins - 1 {
            buffer[fft_size - bin] = buffer[bin].conj();
        }
        inverse.process(&mut buffer);

        for i in 0..fft_size {
            output[synthesis_pos + i] += buffer[i].re * norm * window[i];
            window_sum[synthesis_pos + i] += window[i] * window[i];
        }
    }

    // Window-sum normalisation, clamped where overlap is thin
    let max_sum = window_sum.iter().copied().fold(0.0f32, f32::max);
    let floor = (max_sum * 0.1).max(1e-6);
    for (sample, &ws) in output.iter_mut().zip(window_sum.iter()) {
        *sample /= ws.max(floor);
    }

    // Drop the leading pad (scaled to the synthesis timeline) and trim
    let offset = ((fft_size / 2) as f64 * hop_synthesis as f64 / hop_analysis as f64).round() as usize;
    let mut result: Vec<f32> = output.into_iter().skip(offset).take(target_len).collect();
    result.resize(target_len, 0.0);
    result
}

/// Phase vocoder stretch strategy
#[derive(Debug, Clone)]
pub struct PhaseVocoderStretcher {
    fft_size: usize,
    hop_size: usize,
}

impl PhaseVocoderStretcher {
    /// Create a phase vocoder with the given FFT size and analysis hop
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if the FFT size is below 4, the hop
    /// is zero, or the hop exceeds the FFT size.
    pub fn new(fft_size: usize, hop_size: usize) -> Result<Self, EngineError> {
        if fft_size < 4 || hop_size == 0 || hop_size > fft_size {
            return Err(EngineError::InvalidInput(format!(
                "Invalid phase vocoder parameters: fft_size={}, hop_size={}",
                fft_size, hop_size
            )));
        }
        Ok(Self { fft_size, hop_size })
    }
}

impl StretchStrategy for PhaseVocoderStretcher {
    fn name(&self) -> &str {
        "phase-vocoder"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn process(
        &self,
        input: &AudioBuffer,
        tempo_ratio: f64,
        semitones: f64,
    ) -> Result<AudioBuffer, EngineError> {
        let pitch = 2f64.powf(semitones / 12.0);
        let stretch = pitch / tempo_ratio;
        if !stretch.is_finite() || !(1.0 / MAX_STRETCH_FACTOR..=MAX_STRETCH_FACTOR).contains(&stretch) {
            return Err(EngineError::NumericalError(format!(
                "Stretch factor {:e} (ratio {}, {} semitones) out of range",
                stretch, tempo_ratio, semitones
            )));
        }
        let out_frames = (input.frames() as f64 / tempo_ratio).round() as usize;
        log::debug!(
            "Phase vocoder: {} frames, ratio {:.4}, pitch factor {:.4} -> {} frames",
            input.frames(),
            tempo_ratio,
            pitch,
            out_frames
        );

        let channels: Vec<Vec<f32>> = input
            .to_planar()
            .iter()
            .map(|channel| {
                let stretched = stretch_channel(channel, stretch, self.fft_size, self.hop_size);
                resample_cubic(&stretched, out_frames)
            })
            .collect();

        if channels.iter().flatten().any(|s| !s.is_finite()) {
            return Err(EngineError::NumericalError(
                "Phase vocoder produced non-finite samples".to_string(),
            ));
        }
        AudioBuffer::from_planar(&channels, input.sample_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| 0.5 * (TWO_PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count()
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(3.0 * PI) - PI).abs() < 1e-4 || (wrap_phase(3.0 * PI) + PI).abs() < 1e-4);
        assert!((wrap_phase(0.5) - 0.5).abs() < 1e-6);
        assert!((wrap_phase(-TWO_PI + 0.25) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_stretch_length_is_exact() {
        let input = sine(440.0, 1.0, 22050);
        for &factor in &[0.5, 0.8, 1.0, 1.25, 2.0] {
            let out = stretch_channel(&input, factor, 1024, 256);
            assert_eq!(out.len(), (input.len() as f64 * factor).round() as usize);
        }
    }

    #[test]
    fn test_time_stretch_keeps_pitch() {
        let sr = 22050;
        let input = sine(440.0, 2.0, sr);
        let out = stretch_channel(&input, 1.5, 2048, 512);
        let mid_in = &input[4096..input.len() - 4096];
        let mid_out = &out[4096..out.len() - 4096];
        let rate_in = zero_crossings(mid_in) as f32 / mid_in.len() as f32;
        let rate_out = zero_crossings(mid_out) as f32 / mid_out.len() as f32;
        assert!(
            (rate_out / rate_in - 1.0).abs() < 0.05,
            "crossing rate changed: {} -> {}",
            rate_in,
            rate_out
        );
    }

    #[test]
    fn test_octave_shift_doubles_crossings() {
        let sr = 44100;
        let input = AudioBuffer::from_mono(sine(220.0, 2.0, sr), sr).unwrap();
        let pv = PhaseVocoderStretcher::new(2048, 512).unwrap();
        let out = pv.process(&input, 1.0, 12.0).unwrap();
        assert_eq!(out.frames(), input.frames());

        let a = input.samples();
        let b = out.samples();
        let mid = 8192..a.len() - 8192;
        let ratio = zero_crossings(&b[mid.clone()]) as f32 / zero_crossings(&a[mid]) as f32;
        assert!((ratio - 2.0).abs() < 0.2, "crossing ratio {}", ratio);
    }

    #[test]
    fn test_extreme_pitch_factor_is_error() {
        let input = AudioBuffer::from_mono(sine(440.0, 0.1, 44100), 44100).unwrap();
        let pv = PhaseVocoderStretcher::new(2048, 512).unwrap();
        assert!(matches!(
            pv.process(&input, 1.0, 600.0),
            Err(EngineError::NumericalError(_))
        ));
        assert!(matches!(
            pv.process(&input, 100.0, -600.0),
            Err(EngineError::NumericalError(_))
        ));
        assert!(pv.process(&input, 0.5, 24.0).is_ok());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(PhaseVocoderStretcher::new(0, 0).is_err());
        assert!(PhaseVocoderStretcher::new(1024, 2048).is_err());
    }
}
