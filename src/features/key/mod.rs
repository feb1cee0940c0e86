//! Key detection modules
//!
//! Detect musical key using:
//! - Krumhansl-Kessler templates (24 keys)
//! - Template matching
//! - Key clarity scoring
//! - Alignment to a project key

pub mod alignment;
pub mod detector;
pub mod key_clarity;
pub mod templates;

pub use alignment::semitone_delta;
pub use detector::detect_key;
pub use key_clarity::compute_key_clarity;
pub use templates::KeyTemplates;

use crate::analysis::result::Key;

/// Key detection result
#[derive(Debug, Clone)]
pub struct KeyDetectionResult {
    /// Detected key (best match, or `Key::Unknown`)
    pub key: Key,

    /// Winning correlation, clamped to 0.0-1.0
    pub confidence: f32,

    /// Key clarity (0.0-1.0)
    pub clarity: f32,

    /// All 24 key scores (ranked, highest first)
    pub all_scores: Vec<(Key, f32)>,
}

impl KeyDetectionResult {
    /// Result for input without a usable tonal profile
    pub fn unknown() -> Self {
        Self {
            key: Key::Unknown,
            confidence: 0.0,
            clarity: 0.0,
            all_scores: vec![],
        }
    }
}
