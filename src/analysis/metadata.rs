//! Analysis metadata structures

use serde::{Deserialize, Serialize};

/// Analysis flags
///
/// Recoverable conditions that shaped the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisFlag {
    /// Too few beats; sections are equal-width fallbacks
    DegradedStructure,
    /// No tonal profile; key is `Key::Unknown`
    KeyUnknown,
    /// No pulse found; bpm is the 120.0 default
    TempoFallback,
}

/// Analysis metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisMetadata {
    /// Sample rate the analysis ran at, in Hz
    pub sample_rate: u32,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Tempo pulse clarity (0.0-1.0), 0.0 without a tempo
    pub tempo_clarity: f32,

    /// Key clarity (0.0-1.0)
    pub key_clarity: f32,

    /// Cluster count chosen by segmentation (0 for fallback sections)
    pub n_clusters: usize,

    /// Analysis flags
    pub flags: Vec<AnalysisFlag>,
}

impl AnalysisMetadata {
    /// True if `flag` is set
    pub fn has_flag(&self, flag: AnalysisFlag) -> bool {
        self.flags.contains(&flag)
    }
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            sample_rate: 0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            tempo_clarity: 0.0,
            key_clarity: 0.0,
            n_clusters: 0,
            flags: vec![],
        }
    }
}
