//! In-memory audio buffers
//!
//! [`AudioBuffer`] is the unit of exchange between the engine and its host:
//! decoded sources come in as one, stretched slices and rendered mixes go out
//! as one. Samples are stored interleaved (`L R L R ...` for stereo) and the
//! buffer is never mutated after construction; every transform returns a new
//! buffer.

use crate::error::EngineError;
use crate::preprocessing::channel_mixer;
use crate::preprocessing::resample::resample_cubic;

/// Tolerance (seconds) when checking a slice window against the buffer duration
const SLICE_TOLERANCE_SECONDS: f64 = 1e-3;

/// Interleaved, immutable audio buffer
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if the sample rate or channel count is
    /// zero or the sample count is not a multiple of the channel count, and
    /// `EngineError::NumericalError` if any sample is NaN or infinite.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self, EngineError> {
        if sample_rate == 0 {
            return Err(EngineError::InvalidInput("Invalid sample rate: 0".to_string()));
        }
        if channels == 0 {
            return Err(EngineError::InvalidInput("Invalid channel count: 0".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(EngineError::InvalidInput(format!(
                "{} samples cannot be split into {} channels",
                samples.len(),
                channels
            )));
        }
        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(EngineError::NumericalError(format!(
                "Non-finite sample at index {}",
                pos
            )));
        }

        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Create a single-channel buffer
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, EngineError> {
        Self::new(samples, sample_rate, 1)
    }

    /// Create a buffer from one vector per channel
    ///
    /// All channels must have the same length.
    pub fn from_planar(channels: &[Vec<f32>], sample_rate: u32) -> Result<Self, EngineError> {
        if channels.is_empty() {
            return Err(EngineError::InvalidInput("No channels supplied".to_string()));
        }
        let frames = channels[0].len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(EngineError::InvalidInput(
                "Planar channels have different lengths".to_string(),
            ));
        }
        if channels.len() > u16::MAX as usize {
            return Err(EngineError::InvalidInput(format!(
                "Too many channels: {}",
                channels.len()
            )));
        }

        let mut samples = Vec::with_capacity(frames * channels.len());
        for i in 0..frames {
            for channel in channels {
                samples.push(channel[i]);
            }
        }

        Self::new(samples, sample_rate, channels.len() as u16)
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the buffer, returning its interleaved samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// True if the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value (0.0 for an empty buffer)
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Copy of one channel
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if `index` is out of range.
    pub fn channel(&self, index: usize) -> Result<Vec<f32>, EngineError> {
        let channels = self.channels as usize;
        if index >= channels {
            return Err(EngineError::InvalidInput(format!(
                "Channel {} out of range ({} channels)",
                index, channels
            )));
        }
        Ok(self
            .samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect())
    }

    /// One vector per channel
    pub fn to_planar(&self) -> Vec<Vec<f32>> {
        channel_mixer::deinterleave(&self.samples, self.channels as usize)
    }

    /// Average of all channels
    pub fn to_mono(&self) -> Vec<f32> {
        channel_mixer::downmix(&self.samples, self.channels as usize)
    }

    /// Two-channel version of this buffer
    ///
    /// Mono is duplicated to both sides; stereo is returned as is; wider
    /// layouts are folded down to their average on both sides.
    pub fn to_stereo(&self) -> AudioBuffer {
        match self.channels {
            2 => self.clone(),
            _ => {
                let mono = self.to_mono();
                let samples = channel_mixer::interleave(&[mono.clone(), mono]);
                AudioBuffer {
                    samples,
                    sample_rate: self.sample_rate,
                    channels: 2,
                }
            }
        }
    }

    /// Copy of the frames in `[start, end)` seconds
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if the window is empty, negative,
    /// non-finite or extends past the end of the buffer.
    pub fn slice_seconds(&self, start: f64, end: f64) -> Result<AudioBuffer, EngineError> {
        let duration = self.duration_seconds();
        if !start.is_finite() || !end.is_finite() {
            return Err(EngineError::InvalidInput(
                "Slice bounds must be finite".to_string(),
            ));
        }
        if start < 0.0 || end <= start || end > duration + SLICE_TOLERANCE_SECONDS {
            return Err(EngineError::InvalidInput(format!(
                "Slice [{:.3}, {:.3}) outside source duration {:.3}s",
                start, end, duration
            )));
        }

        let frames = self.frames();
        let first = ((start * self.sample_rate as f64).round() as usize).min(frames);
        let last = ((end * self.sample_rate as f64).round() as usize).min(frames);
        let channels = self.channels as usize;

        Ok(AudioBuffer {
            samples: self.samples[first * channels..last * channels].to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }

    /// Resample every channel to `target_rate` with cubic interpolation
    pub fn resample(&self, target_rate: u32) -> Result<AudioBuffer, EngineError> {
        if target_rate == 0 {
            return Err(EngineError::InvalidInput(
                "Invalid target sample rate: 0".to_string(),
            ));
        }
        if target_rate == self.sample_rate {
            return Ok(self.clone());
        }

        let frames = self.frames();
        let out_len =
            (frames as f64 * target_rate as f64 / self.sample_rate as f64).round() as usize;
        log::debug!(
            "Resampling {} frames {} Hz -> {} Hz ({} frames)",
            frames,
            self.sample_rate,
            target_rate,
            out_len
        );

        let planar: Vec<Vec<f32>> = self
            .to_planar()
            .iter()
            .map(|channel| resample_cubic(channel, out_len))
            .collect();

        Ok(AudioBuffer {
            samples: channel_mixer::interleave(&planar),
            sample_rate: target_rate,
            channels: self.channels,
        })
    }

    /// Concatenate the buffer with itself `count` times
    ///
    /// A count of 0 or 1 returns a copy.
    pub fn repeat(&self, count: usize) -> AudioBuffer {
        AudioBuffer {
            samples: self.samples.repeat(count.max(1)),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}
