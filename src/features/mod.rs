//! Feature extraction modules
//!
//! This module contains all feature extraction algorithms:
//! - Spectral front end (STFT, mel, MFCC)
//! - Onset strength
//! - Period estimation (global tempo, tempogram)
//! - Beat tracking
//! - Chroma extraction
//! - Key detection
//! - Beat-synchronous stacking
//!
//! [`extract_features`] runs the whole front end over a mono buffer and
//! returns everything downstream stages need in one [`FeatureSet`].

pub mod beat_tracking;
pub mod chroma;
pub mod key;
pub mod onset;
pub mod period;
pub mod spectral;
pub mod stack;

use crate::config::AnalysisConfig;
use crate::error::EngineError;
use period::TempoEstimate;

/// Top dB range kept when converting mel power to decibels
const TOP_DB: f32 = 80.0;

/// Everything the front end computes for one buffer
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Buffer duration in seconds
    pub duration: f32,

    /// STFT/onset frames per second
    pub frame_rate: f32,

    /// Global tempo, `None` when no pulse was found
    pub tempo: Option<TempoEstimate>,

    /// Beat positions in onset frames
    pub beat_frames: Vec<usize>,

    /// Beat positions in seconds
    pub beat_times: Vec<f32>,

    /// Smoothed frame-level chroma (`[frame][12]`)
    pub chroma: Vec<Vec<f32>>,

    /// Sync frame start times in seconds, plus the buffer duration as the
    /// final edge (`len == stacked.len() + 1`)
    pub sync_times: Vec<f32>,

    /// Standardised beat-synchronous feature matrix (`[sync_frame][dim]`)
    ///
    /// Empty when `degraded` is set.
    pub stacked: Vec<Vec<f32>>,

    /// Too few beats for structural analysis
    pub degraded: bool,
}

impl FeatureSet {
    /// Number of beat-synchronous frames
    pub fn n_sync_frames(&self) -> usize {
        self.stacked.len()
    }
}

/// Extract tempo, beats and stacked structural features from mono audio
///
/// # Arguments
///
/// * `samples` - Mono samples at `sample_rate`
/// * `sample_rate` - Sample rate in Hz (normally the analysis rate, 22050)
/// * `config` - Analysis configuration
///
/// # Returns
///
/// A [`FeatureSet`]. Input with fewer than `config.min_beats` beats is not an
/// error: the set is returned with `degraded = true` and no stacked matrix.
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` for empty input or invalid parameters.
pub fn extract_features(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<FeatureSet, EngineError> {
    if samples.is_empty() {
        return Err(EngineError::InvalidInput("Empty audio samples".to_string()));
    }
    let duration = samples.len() as f32 / sample_rate as f32;
    log::debug!(
        "Extracting features: {} samples at {} Hz ({:.2}s)",
        samples.len(),
        sample_rate,
        duration
    );

    // Step 1: Spectral front end
    let spec = spectral::power_spectrogram(samples, sample_rate, config.frame_size, config.hop_size)?;
    let frame_rate = spec.frame_rate();
    let mel = spectral::mel::mel_spectrogram(&spec, config.n_mels);
    let log_mel = spectral::mel::power_to_db(&mel, TOP_DB);

    // Step 2: Onsets, tempo, beats
    let onset_env = onset::onset_strength(&log_mel);
    let tempo = period::autocorrelation::estimate_tempo(
        &onset_env,
        frame_rate,
        config.min_bpm,
        config.max_bpm,
        config.prior_bpm,
        config.pulse_clarity_threshold,
    )?;

    let beat_frames: Vec<usize> = match tempo {
        Some(t) => beat_tracking::track_beats(&onset_env, t.period_frames, config.beat_tightness)?
            .into_iter()
            .filter(|&f| f * config.hop_size < samples.len())
            .collect(),
        None => vec![],
    };
    let beat_times = beat_tracking::frames_to_seconds(&beat_frames, config.hop_size, sample_rate);

    // Step 3: Harmony
    let raw_chroma = chroma::extract_chroma(&spec, config.soft_mapping_sigma);
    let chroma = chroma::smoothing::smooth_chroma(&raw_chroma, config.chroma_smoothing_window);

    if beat_frames.len() < config.min_beats {
        log::warn!(
            "Only {} beats detected (minimum {}), structural analysis degraded",
            beat_frames.len(),
            config.min_beats
        );
        return Ok(FeatureSet {
            duration,
            frame_rate,
            tempo,
            beat_frames,
            beat_times,
            chroma,
            sync_times: vec![],
            stacked: vec![],
            degraded: true,
        });
    }

    // Step 4: Timbre and rhythm
    let mfcc = spectral::mfcc::mfcc(&log_mel, config.n_mfcc);
    let d1 = spectral::mfcc::delta(&mfcc);
    let d2 = spectral::mfcc::delta(&d1);
    let tempogram = period::tempogram::compute_tempogram(&onset_env, config.tempogram_win_length);

    // Step 5: Beat-synchronous stack
    let edges = stack::sync_edges(&beat_frames, spec.n_frames());
    let stacked = stack::stack_features(&[&chroma, &mfcc, &d1, &d2, &tempogram], &edges);

    let mut sync_times: Vec<f32> = edges[..edges.len() - 1]
        .iter()
        .map(|&f| (f * config.hop_size) as f32 / sample_rate as f32)
        .collect();
    sync_times.push(duration);

    Ok(FeatureSet {
        duration,
        frame_rate,
        tempo,
        beat_frames,
        beat_times,
        chroma,
        sync_times,
        stacked,
        degraded: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Short decaying noise bursts at a fixed tempo
    fn generate_click_track(bpm: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        let period = (60.0 / bpm * sample_rate as f32) as usize;
        let mut seed = 12345u32;
        let mut samples = vec![0.0f32; n];
        let mut i = 0;
        while i < n {
            for j in 0..400.min(n - i) {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
                let noise = (seed >> 16) as f32 / 32768.0 - 1.0;
                samples[i + j] = noise * (-(j as f32) / 80.0).exp();
            }
            i += period;
        }
        samples
    }

    #[test]
    fn test_click_track_has_tempo_and_beats() {
        let samples = generate_click_track(120.0, 20.0, 22050);
        let features = extract_features(&samples, 22050, &AnalysisConfig::default()).unwrap();
        let tempo = features.tempo.expect("click track has a pulse");
        assert!(
            (tempo.bpm - 120.0).abs() < 4.0,
            "expected ~120 BPM, got {:.1}",
            tempo.bpm
        );
        assert!(!features.degraded);
        assert!(features.beat_times.len() >= 30);
        assert_eq!(features.sync_times.len(), features.stacked.len() + 1);
        assert_eq!(*features.sync_times.last().unwrap(), features.duration);
        assert!(features.sync_times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_silence_is_degraded_not_error() {
        let samples = vec![0.0f32; 22050 * 5];
        let features = extract_features(&samples, 22050, &AnalysisConfig::default()).unwrap();
        assert!(features.tempo.is_none());
        assert!(features.degraded);
        assert!(features.stacked.is_empty());
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(extract_features(&[], 22050, &AnalysisConfig::default()).is_err());
    }
}
