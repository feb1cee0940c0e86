//! Audio preprocessing modules
//!
//! This module contains utilities shared by analysis and rendering:
//! - Channel mixing (downmix, interleave)
//! - Sample-rate conversion
//! - Gain (peak ceiling, linear fades)

pub mod channel_mixer;
pub mod normalization;
pub mod resample;
