//! Chroma vector extraction
//!
//! Converts a power spectrogram to 12-element chroma vectors using a soft
//! pitch-class mapping: every FFT bin between 55 Hz and 5 kHz contributes its
//! magnitude to each pitch class with a Gaussian weight over the circular
//! semitone distance.

use crate::features::spectral::Spectrogram;

/// Lowest frequency mapped to chroma (A1)
const MIN_FREQ_HZ: f32 = 55.0;

/// Highest frequency mapped to chroma
const MAX_FREQ_HZ: f32 = 5000.0;

/// Frames quieter than this fraction of the loudest frame are treated as silence
const SILENCE_RATIO: f32 = 1e-4;

/// Extract chroma vectors from a power spectrogram
///
/// # Arguments
///
/// * `spec` - Power spectrogram
/// * `sigma` - Soft mapping standard deviation in semitones (default: 0.5)
///
/// # Returns
///
/// One 12-element chroma vector per frame (index 0 = C), each normalised so
/// its largest bin is 1.0. Silent frames are all zeros.
pub fn extract_chroma(spec: &Spectrogram, sigma: f32) -> Vec<Vec<f32>> {
    let sigma = sigma.max(1e-3);

    // Per-bin pitch class weights, computed once
    let mapping: Vec<(usize, [f32; 12])> = (1..spec.n_bins())
        .filter_map(|bin| {
            let freq = spec.bin_frequency(bin);
            if !(MIN_FREQ_HZ..=MAX_FREQ_HZ).contains(&freq) {
                return None;
            }
            let midi = 69.0 + 12.0 * (freq / 440.0).log2();
            let pitch = midi.rem_euclid(12.0);
            let mut weights = [0.0f32; 12];
            for (pc, w) in weights.iter_mut().enumerate() {
                let mut d = (pitch - pc as f32).abs();
                if d > 6.0 {
                    d = 12.0 - d;
                }
                *w = (-0.5 * (d / sigma) * (d / sigma)).exp();
            }
            Some((bin, weights))
        })
        .collect();

    let mut chroma: Vec<Vec<f32>> = Vec::with_capacity(spec.n_frames());
    let mut energies: Vec<f32> = Vec::with_capacity(spec.n_frames());

    for frame in &spec.frames {
        let mut vector = vec![0.0f32; 12];
        let mut energy = 0.0f32;
        for (bin, weights) in &mapping {
            let magnitude = frame[*bin].sqrt();
            energy += magnitude;
            for (pc, w) in weights.iter().enumerate() {
                vector[pc] += magnitude * w;
            }
        }
        chroma.push(vector);
        energies.push(energy);
    }

    let loudest = energies.iter().copied().fold(0.0f32, f32::max);
    let gate = loudest * SILENCE_RATIO;
    let mut silent = 0usize;

    for (vector, &energy) in chroma.iter_mut().zip(energies.iter()) {
        let max = vector.iter().copied().fold(0.0f32, f32::max);
        if energy <= gate || max <= 0.0 {
            vector.iter_mut().for_each(|v| *v = 0.0);
            silent += 1;
        } else {
            vector.iter_mut().for_each(|v| *v /= max);
        }
    }

    log::debug!(
        "Extracted {} chroma vectors ({} silent)",
        chroma.len(),
        silent
    );
    chroma
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::spectral::power_spectrogram;

    fn generate_tone(freqs: &[f32], sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                freqs
                    .iter()
                    .map(|f| (2.0 * std::f32::consts::PI * f * t).sin())
                    .sum::<f32>()
                    / freqs.len() as f32
            })
            .collect()
    }

    #[test]
    fn test_a440_maps_to_pitch_class_a() {
        let samples = generate_tone(&[440.0], 22050, 1.0);
        let spec = power_spectrogram(&samples, 22050, 2048, 512).unwrap();
        let chroma = extract_chroma(&spec, 0.5);
        let mid = &chroma[chroma.len() / 2];
        let best = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(best, 9);
        assert!((mid[9] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_silence_is_zero() {
        let mut samples = vec![0.0f32; 22050];
        samples.extend(generate_tone(&[261.63], 22050, 1.0));
        let spec = power_spectrogram(&samples, 22050, 2048, 512).unwrap();
        let chroma = extract_chroma(&spec, 0.5);
        assert!(chroma[5].iter().all(|&v| v == 0.0));
        assert!(chroma[chroma.len() - 10].iter().any(|&v| v > 0.0));
    }
}
