//! Beat tracking modules
//!
//! Turn the onset envelope and a global tempo into beat positions:
//! - Dynamic-programming beat tracker

pub mod dynamic_programming;

pub use dynamic_programming::track_beats;

/// Convert onset frame indices to seconds
pub fn frames_to_seconds(frames: &[usize], hop_size: usize, sample_rate: u32) -> Vec<f32> {
    frames
        .iter()
        .map(|&f| (f * hop_size) as f32 / sample_rate as f32)
        .collect()
}
