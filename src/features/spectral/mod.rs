//! Spectral front end
//!
//! - STFT power spectrogram
//! - Mel filterbank and dB conversion
//! - MFCC and regression deltas

pub mod mel;
pub mod mfcc;
pub mod stft;

pub use stft::{power_spectrogram, Spectrogram};
