//! Onset detection modules
//!
//! Whole-buffer onset strength envelope used by tempo estimation, beat
//! tracking and the rhythm tempogram.

pub mod spectral_flux;

pub use spectral_flux::onset_strength;
