//! Period estimation modules
//!
//! Periodicity of the onset envelope:
//! - Global tempo from autocorrelation
//! - Local autocorrelation tempogram (rhythm features)

pub mod autocorrelation;
pub mod tempogram;

/// Global tempo estimate
#[derive(Debug, Clone, Copy)]
pub struct TempoEstimate {
    /// BPM estimate
    pub bpm: f32,

    /// Beat period in onset frames (fractional)
    pub period_frames: f32,

    /// Normalised autocorrelation at the chosen lag (0.0-1.0)
    pub clarity: f32,
}
