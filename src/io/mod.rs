//! Audio I/O modules
//!
//! In-memory buffers, decoding using Symphonia and WAV encoding using hound.

pub mod decoder;
pub mod sample_buffer;
pub mod wav;

pub use decoder::decode_audio;
pub use sample_buffer::AudioBuffer;
