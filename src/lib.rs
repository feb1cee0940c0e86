//! # Mixgrid DSP
//!
//! Structural audio analysis and bar-grid arrangement rendering.
//!
//! ## Features
//!
//! - **Tempo & Beats**: Onset-envelope autocorrelation with a tempo prior and
//!   dynamic-programming beat tracking
//! - **Key Detection**: Chroma-based analysis with Krumhansl-Kessler template matching
//! - **Structure**: Self-similarity novelty, boundary picking, short-segment
//!   merging and spectral clustering into labelled sections
//! - **Rendering**: Time-stretch / pitch-shift (external processor or phase
//!   vocoder fallback), looping, bar-grid placement with crossfades, fade-out
//!   and peak ceiling
//!
//! ## Quick Start
//!
//! ```no_run
//! use mixgrid_dsp::{analyze_file, AnalysisConfig};
//!
//! let result = analyze_file("track.mp3", &AnalysisConfig::default())?;
//!
//! println!("BPM: {:.2}, key: {}", result.bpm, result.key);
//! for section in &result.sections {
//!     println!("{:>8.2}s - {:>8.2}s  {}", section.start, section.end, section.label);
//! }
//! # Ok::<(), mixgrid_dsp::EngineError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Audio → Preprocessing → Features → Key / Structure → AnalysisResult
//! Sources + ArrangementItems → Stretch → Timeline → Mix
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod identity;
pub mod io;
pub mod preprocessing;
pub mod render;
pub mod store;
pub mod structure;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

// Re-export main types
pub use analysis::{AnalysisFlag, AnalysisMetadata, AnalysisResult, Key, Section};
pub use config::{AnalysisConfig, RenderConfig, SegmentationConfig, StretchConfig};
pub use error::EngineError;
pub use features::key::semitone_delta;
pub use io::{decode_audio, AudioBuffer};
pub use render::{render_arrangement, ArrangementItem, Mix, RenderOutput, StretchOutcome, TimeStretcher};
pub use store::{MemoryStore, Store};

/// BPM reported when no pulse is found
pub const DEFAULT_BPM: f32 = 120.0;

/// Main analysis function
///
/// Downmixes to mono, resamples to the analysis rate, then runs feature
/// extraction, key detection and structural segmentation.
///
/// # Arguments
///
/// * `buffer` - Decoded audio at any rate and channel count
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `AnalysisResult` with tempo, key, sections and beats. Recoverable
/// conditions (no pulse, no tonality, too few beats) are reported through
/// `metadata.flags` rather than as errors.
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` for an empty buffer or a zero
/// analysis rate, and propagates processing errors.
///
/// # Example
///
/// ```no_run
/// use mixgrid_dsp::{analyze_audio, AnalysisConfig, AudioBuffer};
///
/// let buffer = AudioBuffer::from_mono(vec![0.0f32; 44100 * 30], 44100)?;
/// let result = analyze_audio(&buffer, &AnalysisConfig::default())?;
/// assert_eq!(result.sections.len(), 4); // silence: fallback sections
/// # Ok::<(), mixgrid_dsp::EngineError>(())
/// ```
pub fn analyze_audio(buffer: &AudioBuffer, config: &AnalysisConfig) -> Result<AnalysisResult, EngineError> {
    let start_time = Instant::now();

    if buffer.is_empty() {
        return Err(EngineError::InvalidInput("Empty audio buffer".to_string()));
    }
    if config.analysis_sample_rate == 0 {
        return Err(EngineError::InvalidInput("Invalid analysis sample rate".to_string()));
    }
    log::debug!(
        "Starting analysis: {} frames, {} channels at {} Hz",
        buffer.frames(),
        buffer.channels(),
        buffer.sample_rate()
    );

    // Preprocessing: mono at the analysis rate
    let mono = buffer.to_mono();
    let samples = preprocessing::resample::resample_to_rate(
        &mono,
        buffer.sample_rate(),
        config.analysis_sample_rate,
    );

    // Features: tempo, beats, chroma, stacked matrix
    let features = features::extract_features(&samples, config.analysis_sample_rate, config)?;

    // Key from sharpened chroma
    let sharpened: Vec<Vec<f32>> = features
        .chroma
        .iter()
        .map(|frame| features::chroma::normalization::sharpen_chroma(frame, config.chroma_sharpening_power))
        .collect();
    let key_result = features::key::detect_key(&sharpened, &features::key::KeyTemplates::new())?;

    // Structure
    let labeler = structure::RepetitionLabeler::from_config(&config.segmentation);
    let segmentation = structure::segment(&features, &config.segmentation, &labeler)?;

    let mut flags = Vec::new();
    let bpm = match features.tempo {
        Some(t) => t.bpm,
        None => {
            log::warn!("No tempo found, reporting {:.1} BPM", DEFAULT_BPM);
            flags.push(AnalysisFlag::TempoFallback);
            DEFAULT_BPM
        }
    };
    if segmentation.degraded {
        flags.push(AnalysisFlag::DegradedStructure);
    }
    if key_result.key.is_unknown() {
        flags.push(AnalysisFlag::KeyUnknown);
    }

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    let result = AnalysisResult {
        bpm,
        key: key_result.key,
        key_confidence: key_result.confidence,
        duration: features.duration,
        sections: segmentation.sections,
        beats: features.beat_times.clone(),
        metadata: AnalysisMetadata {
            sample_rate: config.analysis_sample_rate,
            processing_time_ms,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            tempo_clarity: features.tempo.map(|t| t.clarity).unwrap_or(0.0),
            key_clarity: key_result.clarity,
            n_clusters: segmentation.n_clusters,
            flags,
        },
    };
    result.validate()?;

    log::debug!(
        "Analysis complete: {:.2} BPM, key {}, {} sections in {:.1} ms",
        result.bpm,
        result.key,
        result.sections.len(),
        processing_time_ms
    );
    Ok(result)
}

/// Decode a file and analyse it
///
/// # Errors
///
/// Returns `EngineError::IoError` / `EngineError::DecodingError` for
/// unreadable sources, plus any [`analyze_audio`] error.
pub fn analyze_file<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<AnalysisResult, EngineError> {
    let buffer = decode_audio(path)?;
    analyze_audio(&buffer, config)
}

/// Analyse a file unless a result for identical content is already stored
///
/// Results are keyed by [`identity::file_content_hash`].
///
/// # Returns
///
/// The content identifier and the (possibly cached) result
pub fn analyze_cached<P: AsRef<Path>>(
    path: P,
    store: &mut dyn Store<AnalysisResult>,
    config: &AnalysisConfig,
) -> Result<(String, Arc<AnalysisResult>), EngineError> {
    let id = identity::file_content_hash(path.as_ref())?;
    if let Some(result) = store.get(&id) {
        log::debug!("Analysis cache hit for {}", id);
        return Ok((id, result));
    }
    let result = analyze_file(path, config)?;
    let stored = store.put(id.clone(), result);
    Ok((id, stored))
}

/// Slice a source and move it to a target tempo and pitch
///
/// Preview of how a slice will sound on the grid, without placing it.
///
/// # Arguments
///
/// * `source` - Source audio
/// * `start`, `end` - Slice window in seconds
/// * `source_bpm` - Tempo of the source (clamped away from zero)
/// * `target_bpm` - Project tempo
/// * `semitones` - Pitch shift
/// * `stretcher` - Tempo/pitch transformer
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` for a bad slice window and any
/// stretch error.
pub fn align_slice(
    source: &AudioBuffer,
    start: f64,
    end: f64,
    source_bpm: f64,
    target_bpm: f64,
    semitones: f64,
    stretcher: &TimeStretcher,
) -> Result<StretchOutcome, EngineError> {
    let slice = source.slice_seconds(start, end)?;
    let (ratio, warning) = render::stretch::tempo_ratio(target_bpm, source_bpm)?;
    let mut outcome = stretcher.stretch(&slice, ratio, semitones)?;
    if let Some(w) = warning {
        outcome.warnings.insert(0, w);
    }
    Ok(outcome)
}
