//! Configuration parameters for analysis, segmentation, stretching and rendering
//!
//! Every struct has a `Default` matching the engine's reference behaviour and
//! derives `serde` traits so a host can load overrides from JSON.

use serde::{Deserialize, Serialize};

/// Analysis configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Internal analysis sample rate in Hz (default: 22050)
    /// Input is downmixed to mono and resampled to this rate first
    pub analysis_sample_rate: u32,

    // STFT parameters
    /// Frame size for STFT (default: 2048)
    pub frame_size: usize,

    /// Hop size for STFT (default: 512)
    pub hop_size: usize,

    // Tempo / beat tracking
    /// Minimum BPM to consider (default: 60.0)
    pub min_bpm: f32,

    /// Maximum BPM to consider (default: 200.0)
    pub max_bpm: f32,

    /// Centre of the log-normal tempo prior (default: 120.0)
    pub prior_bpm: f32,

    /// Minimum normalised autocorrelation at the winning lag (default: 0.1)
    /// Below this the input is treated as having no detectable pulse
    pub pulse_clarity_threshold: f32,

    /// Beat-tracker tightness; higher values hold the tempo more rigidly (default: 100.0)
    pub beat_tightness: f32,

    /// Minimum number of beats for structural analysis (default: 8)
    pub min_beats: usize,

    // Timbre
    /// Number of mel bands (default: 64)
    pub n_mels: usize,

    /// Number of MFCC coefficients (default: 20)
    pub n_mfcc: usize,

    // Harmony
    /// Soft mapping standard deviation in semitones (default: 0.5)
    pub soft_mapping_sigma: f32,

    /// Chroma moving-average window in STFT frames (default: 9)
    pub chroma_smoothing_window: usize,

    /// Chroma sharpening power used for key estimation (default: 1.0 = none)
    pub chroma_sharpening_power: f32,

    // Rhythm
    /// Local tempogram window in onset frames (default: 128)
    pub tempogram_win_length: usize,

    /// Structural segmentation parameters
    pub segmentation: SegmentationConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analysis_sample_rate: 22050,
            frame_size: 2048,
            hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 200.0,
            prior_bpm: 120.0,
            pulse_clarity_threshold: 0.1,
            beat_tightness: 100.0,
            min_beats: 8,
            n_mels: 64,
            n_mfcc: 20,
            soft_mapping_sigma: 0.5,
            chroma_smoothing_window: 9,
            chroma_sharpening_power: 1.0,
            tempogram_win_length: 128,
            segmentation: SegmentationConfig::default(),
        }
    }
}

/// Structural segmentation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Checkerboard kernel half-widths in sync frames (default: [16, 32, 64])
    pub kernel_sizes: Vec<usize>,

    /// Fraction of the novelty peak used as the absolute threshold floor (default: 0.25)
    pub relative_threshold: f32,

    /// Median filter window (frames) for the adaptive threshold (default: 15)
    pub median_window: usize,

    /// Half-width of the local-maximum neighbourhood (default: 3)
    pub peak_neighborhood: usize,

    /// Minimum section length in seconds (default: 7.0)
    pub min_segment_seconds: f32,

    /// Smallest cluster count tried when labelling (default: 3)
    pub min_clusters: usize,

    /// Largest cluster count tried when labelling (default: 6)
    pub max_clusters: usize,

    /// Cluster count used when the search range is degenerate (default: 3)
    pub default_clusters: usize,

    /// Upper bound on neighbours in the affinity graph (default: 10)
    pub max_neighbors: usize,

    /// Number of equal sections produced when structure cannot be analysed (default: 4)
    pub fallback_sections: usize,

    /// A first section shorter than this becomes "Intro" (default: 30.0 s)
    pub intro_max_seconds: f32,

    /// A last section longer than this becomes "Outro" (default: 10.0 s)
    pub outro_min_seconds: f32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            kernel_sizes: vec![16, 32, 64],
            relative_threshold: 0.25,
            median_window: 15,
            peak_neighborhood: 3,
            min_segment_seconds: 7.0,
            min_clusters: 3,
            max_clusters: 6,
            default_clusters: 3,
            max_neighbors: 10,
            fallback_sections: 4,
            intro_max_seconds: 30.0,
            outro_min_seconds: 10.0,
        }
    }
}

/// Time-stretch / pitch-shift parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchConfig {
    /// External processor program (default: "rubberband")
    pub processor_program: String,

    /// Tempo ratios within this distance of 1.0 count as "no stretch" (default: 1e-6)
    pub ratio_tolerance: f64,

    /// Semitone shifts within this distance of 0.0 count as "no shift" (default: 1e-3)
    pub semitone_tolerance: f64,

    /// Use the in-process phase vocoder when the external processor fails (default: true)
    pub allow_fallback: bool,

    /// Phase vocoder FFT size (default: 2048)
    pub fft_size: usize,

    /// Phase vocoder analysis hop (default: 512)
    pub hop_size: usize,
}

impl Default for StretchConfig {
    fn default() -> Self {
        Self {
            processor_program: "rubberband".to_string(),
            ratio_tolerance: 1e-6,
            semitone_tolerance: 1e-3,
            allow_fallback: true,
            fft_size: 2048,
            hop_size: 512,
        }
    }
}

/// Timeline rendering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output sample rate in Hz (default: 44100)
    pub target_sample_rate: u32,

    /// Output channel count (default: 2)
    pub channels: u16,

    /// Beats per bar; the grid is fixed at 4/4 (default: 4)
    pub beats_per_bar: u32,

    /// Crossfade at each item's leading edge in milliseconds (default: 120)
    pub crossfade_ms: u32,

    /// Extend the output to at least this many bars
    pub min_bars: Option<u32>,

    /// Linear fade-out at the very end in milliseconds (default: 0 = disabled)
    pub master_fade_out_ms: u32,

    /// Peak ceiling for the final gentle normalisation (default: 0.99)
    pub peak_ceiling: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 44100,
            channels: 2,
            beats_per_bar: 4,
            crossfade_ms: 120,
            min_bars: None,
            master_fade_out_ms: 0,
            peak_ceiling: 0.99,
        }
    }
}
