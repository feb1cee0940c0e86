//! Short-time Fourier transform
//!
//! Frames are centred: the signal is zero-padded by `frame_size / 2` on both
//! sides so frame `t` is centred on sample `t * hop_size`. This keeps frame
//! indices aligned with beat times computed as `frame * hop / sample_rate`.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::EngineError;

/// Power spectrogram (`frames[t][bin]`, `bin` in `0..=frame_size/2`)
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Power (|X|²) per frame and bin
    pub frames: Vec<Vec<f32>>,
    /// FFT frame size
    pub frame_size: usize,
    /// Hop between frames in samples
    pub hop_size: usize,
    /// Sample rate of the analysed signal
    pub sample_rate: u32,
}

impl Spectrogram {
    /// Number of frames
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of frequency bins per frame
    pub fn n_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Centre frequency of `bin` in Hz
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.frame_size as f32
    }

    /// Frames per second
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_size as f32
    }
}

/// Periodic Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
        })
        .collect()
}

/// Compute a centred power spectrogram
///
/// # Arguments
///
/// * `samples` - Mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `frame_size` - FFT size (default: 2048)
/// * `hop_size` - Hop size (default: 512)
///
/// # Returns
///
/// `1 + samples.len() / hop_size` frames of `frame_size / 2 + 1` power bins
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` for empty input or zero sizes.
pub fn power_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<Spectrogram, EngineError> {
    if samples.is_empty() {
        return Err(EngineError::InvalidInput("Empty audio samples".to_string()));
    }
    if frame_size == 0 || hop_size == 0 {
        return Err(EngineError::InvalidInput(format!(
            "Invalid STFT parameters: frame_size={}, hop_size={}",
            frame_size, hop_size
        )));
    }

    let pad = frame_size / 2;
    let n_frames = 1 + samples.len() / hop_size;
    let n_bins = frame_size / 2 + 1;
    let window = hann_window(frame_size);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
    let mut frames = Vec::with_capacity(n_frames);

    for t in 0..n_frames {
        // Sample index of buffer[0] in the unpadded signal
        let origin = (t * hop_size) as isize - pad as isize;
        for (i, (slot, &w)) in buffer.iter_mut().zip(window.iter()).enumerate() {
            let idx = origin + i as isize;
            let s = if idx >= 0 && (idx as usize) < samples.len() {
                samples[idx as usize]
            } else {
                0.0
            };
            *slot = Complex::new(s * w, 0.0);
        }

        fft.process(&mut buffer);
        frames.push(buffer[..n_bins].iter().map(|c| c.norm_sqr()).collect());
    }

    log::debug!(
        "STFT: {} frames x {} bins (frame={}, hop={})",
        n_frames,
        n_bins,
        frame_size,
        hop_size
    );

    Ok(Spectrogram {
        frames,
        frame_size,
        hop_size,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_is_centred() {
        let samples = vec![0.0f32; 22050];
        let spec = power_spectrogram(&samples, 22050, 2048, 512).unwrap();
        assert_eq!(spec.n_frames(), 1 + 22050 / 512);
        assert_eq!(spec.frames[0].len(), 1025);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let sr = 22050;
        let freq = 1000.0f32;
        let samples: Vec<f32> = (0..sr)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect();
        let spec = power_spectrogram(&samples, sr as u32, 2048, 512).unwrap();
        let frame = &spec.frames[spec.n_frames() / 2];
        let peak_bin = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        let expected = (freq * 2048.0 / sr as f32).round() as usize;
        assert!((peak_bin as i32 - expected as i32).abs() <= 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(power_spectrogram(&[], 22050, 2048, 512).is_err());
    }
}
