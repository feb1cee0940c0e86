//! Mel filterbank and decibel conversion

use super::stft::Spectrogram;

const EPSILON: f32 = 1e-10;

/// Hz to mel (HTK formula)
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz (HTK formula)
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// One triangular filter stored sparsely
#[derive(Debug, Clone)]
struct MelFilter {
    first_bin: usize,
    weights: Vec<f32>,
}

/// Triangular mel filterbank spanning 0 Hz to Nyquist
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<MelFilter>,
}

impl MelFilterbank {
    /// Build `n_mels` triangular filters for a given FFT size and sample rate
    pub fn new(n_mels: usize, frame_size: usize, sample_rate: u32) -> Self {
        let n_bins = frame_size / 2 + 1;
        let nyquist = sample_rate as f32 / 2.0;
        let mel_max = hz_to_mel(nyquist);

        // n_mels + 2 edge frequencies, evenly spaced on the mel scale
        let edges: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
            .collect();
        let bin_hz = sample_rate as f32 / frame_size as f32;

        let filters = (0..n_mels)
            .map(|m| {
                let (lo, centre, hi) = (edges[m], edges[m + 1], edges[m + 2]);
                let first_bin = (lo / bin_hz).ceil() as usize;
                let last_bin = ((hi / bin_hz).floor() as usize).min(n_bins - 1);
                let weights = (first_bin..=last_bin.max(first_bin))
                    .map(|k| {
                        let f = k as f32 * bin_hz;
                        let up = (f - lo) / (centre - lo).max(EPSILON);
                        let down = (hi - f) / (hi - centre).max(EPSILON);
                        up.min(down).max(0.0)
                    })
                    .collect();
                MelFilter { first_bin, weights }
            })
            .collect();

        Self { filters }
    }

    /// Number of mel bands
    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Apply the filterbank to one power frame
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|f| {
                f.weights
                    .iter()
                    .enumerate()
                    .filter_map(|(i, w)| power.get(f.first_bin + i).map(|p| p * w))
                    .sum()
            })
            .collect()
    }
}

/// Mel power spectrogram (`[frame][band]`)
pub fn mel_spectrogram(spec: &Spectrogram, n_mels: usize) -> Vec<Vec<f32>> {
    let bank = MelFilterbank::new(n_mels, spec.frame_size, spec.sample_rate);
    spec.frames.iter().map(|frame| bank.apply(frame)).collect()
}

/// Convert power to decibels, flooring at `top_db` below the global maximum
pub fn power_to_db(frames: &[Vec<f32>], top_db: f32) -> Vec<Vec<f32>> {
    let mut db: Vec<Vec<f32>> = frames
        .iter()
        .map(|row| row.iter().map(|&p| 10.0 * p.max(EPSILON).log10()).collect())
        .collect();
    let max_db = db
        .iter()
        .flat_map(|row| row.iter().copied())
        .fold(f32::NEG_INFINITY, f32::max);
    if max_db.is_finite() {
        let floor = max_db - top_db;
        for row in db.iter_mut() {
            for v in row.iter_mut() {
                *v = v.max(floor);
            }
        }
    }
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_inverse() {
        for hz in [0.0f32, 440.0, 1000.0, 8000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 0.5);
        }
    }

    #[test]
    fn test_filterbank_covers_spectrum() {
        let bank = MelFilterbank::new(64, 2048, 22050);
        assert_eq!(bank.n_mels(), 64);
        let flat = vec![1.0f32; 1025];
        let bands = bank.apply(&flat);
        assert!(bands.iter().all(|&b| b > 0.0));
    }

    #[test]
    fn test_power_to_db_floor() {
        let frames = vec![vec![1.0f32, 1e-12]];
        let db = power_to_db(&frames, 80.0);
        assert!((db[0][0] - 0.0).abs() < 1e-4);
        assert!((db[0][1] + 80.0).abs() < 1e-4);
    }
}
