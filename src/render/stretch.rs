//! Time-stretch and pitch-shift with a preferred and a fallback strategy
//!
//! [`TimeStretcher`] tries the preferred strategy (normally the external
//! Rubber Band processor) when its capability probe succeeds, and otherwise
//! uses the in-process phase vocoder, reporting the result as degraded.
//! Tempo and pitch are independent in both paths.
//!
//! # Example
//!
//! ```
//! use mixgrid_dsp::config::StretchConfig;
//! use mixgrid_dsp::io::AudioBuffer;
//! use mixgrid_dsp::render::TimeStretcher;
//!
//! let stretcher = TimeStretcher::new(&StretchConfig::default())?;
//! let input = AudioBuffer::from_mono(vec![0.1; 4410], 44100)?;
//!
//! // Identity parameters return the input unchanged
//! let outcome = stretcher.stretch(&input, 1.0, 0.0)?;
//! assert_eq!(outcome.buffer.samples(), input.samples());
//! assert!(!outcome.degraded);
//! # Ok::<(), mixgrid_dsp::EngineError>(())
//! ```

use super::external::RubberbandProcessor;
use super::phase_vocoder::PhaseVocoderStretcher;
use crate::config::StretchConfig;
use crate::error::EngineError;
use crate::io::AudioBuffer;

/// Smallest source BPM used in ratio computations
pub const MIN_SOURCE_BPM: f64 = 1e-6;

/// Tempo ratio range accepted by the stretcher
pub const MIN_TEMPO_RATIO: f64 = 0.01;
/// Tempo ratio range accepted by the stretcher
pub const MAX_TEMPO_RATIO: f64 = 100.0;

/// Largest pitch shift accepted, in semitones either way (four octaves)
pub const MAX_SEMITONE_SHIFT: f64 = 48.0;

/// A way of changing tempo and pitch independently
pub trait StretchStrategy: Send + Sync {
    /// Short name for logs and warnings
    fn name(&self) -> &str;

    /// Whether the strategy can run in this process
    fn is_available(&self) -> bool;

    /// Change tempo by `tempo_ratio` (output is `1 / tempo_ratio` as long)
    /// and pitch by `semitones`, keeping the sample rate
    fn process(
        &self,
        input: &AudioBuffer,
        tempo_ratio: f64,
        semitones: f64,
    ) -> Result<AudioBuffer, EngineError>;
}

/// Result of one stretch
#[derive(Debug, Clone)]
pub struct StretchOutcome {
    /// Transformed audio at the input's sample rate
    pub buffer: AudioBuffer,

    /// The fallback strategy was used
    pub degraded: bool,

    /// Human-readable notes for the caller (fallback use, clamped values)
    pub warnings: Vec<String>,
}

/// Tempo ratio `target / source`, with the source BPM clamped away from zero
///
/// # Returns
///
/// The ratio and, if the source BPM had to be clamped, a warning.
///
/// # Errors
///
/// Returns `EngineError::NumericalError` for non-finite or non-positive
/// target BPM, or a non-finite source BPM.
pub fn tempo_ratio(target_bpm: f64, source_bpm: f64) -> Result<(f64, Option<String>), EngineError> {
    if !target_bpm.is_finite() || target_bpm <= 0.0 {
        return Err(EngineError::NumericalError(format!(
            "Target BPM must be positive and finite, got {}",
            target_bpm
        )));
    }
    if !source_bpm.is_finite() {
        return Err(EngineError::NumericalError(format!(
            "Source BPM must be finite, got {}",
            source_bpm
        )));
    }
    if source_bpm < MIN_SOURCE_BPM {
        let warning = format!(
            "Source BPM {} clamped to {:e} for ratio computation",
            source_bpm, MIN_SOURCE_BPM
        );
        log::warn!("{}", warning);
        return Ok((target_bpm / MIN_SOURCE_BPM, Some(warning)));
    }
    Ok((target_bpm / source_bpm, None))
}

/// Preferred/fallback stretch dispatcher
pub struct TimeStretcher {
    preferred: Box<dyn StretchStrategy>,
    fallback: Box<dyn StretchStrategy>,
    config: StretchConfig,
}

impl std::fmt::Debug for TimeStretcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeStretcher")
            .field("preferred", &self.preferred.name())
            .field("fallback", &self.fallback.name())
            .field("config", &self.config)
            .finish()
    }
}

impl TimeStretcher {
    /// Rubber Band preferred, phase vocoder fallback
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` for invalid phase vocoder settings.
    pub fn new(config: &StretchConfig) -> Result<Self, EngineError> {
        let preferred = RubberbandProcessor::new(
            config.processor_program.clone(),
            config.ratio_tolerance,
            config.semitone_tolerance,
        );
        let fallback = PhaseVocoderStretcher::new(config.fft_size, config.hop_size)?;
        Ok(Self::with_strategies(
            Box::new(preferred),
            Box::new(fallback),
            config.clone(),
        ))
    }

    /// Custom strategies
    pub fn with_strategies(
        preferred: Box<dyn StretchStrategy>,
        fallback: Box<dyn StretchStrategy>,
        config: StretchConfig,
    ) -> Self {
        Self {
            preferred,
            fallback,
            config,
        }
    }

    /// True if the parameters need no processing
    pub fn is_identity(&self, tempo_ratio: f64, semitones: f64) -> bool {
        (tempo_ratio - 1.0).abs() <= self.config.ratio_tolerance
            && semitones.abs() <= self.config.semitone_tolerance
    }

    /// Change tempo by `tempo_ratio` and pitch by `semitones`
    ///
    /// # Arguments
    ///
    /// * `input` - Slice to transform
    /// * `tempo_ratio` - Target BPM / source BPM (clamped to [0.01, 100])
    /// * `semitones` - Pitch shift in semitones, at most
    ///   [`MAX_SEMITONE_SHIFT`] either way
    ///
    /// # Errors
    ///
    /// - `EngineError::NumericalError` for non-finite parameters
    /// - `EngineError::InvalidInput` for a pitch shift out of range
    /// - `EngineError::ProcessorUnavailable` when the preferred strategy
    ///   cannot run and fallback is disabled
    /// - Any error from the fallback strategy
    pub fn stretch(
        &self,
        input: &AudioBuffer,
        tempo_ratio: f64,
        semitones: f64,
    ) -> Result<StretchOutcome, EngineError> {
        if !tempo_ratio.is_finite() || !semitones.is_finite() {
            return Err(EngineError::NumericalError(format!(
                "Non-finite stretch parameters: ratio={}, semitones={}",
                tempo_ratio, semitones
            )));
        }
        if semitones.abs() > MAX_SEMITONE_SHIFT {
            return Err(EngineError::InvalidInput(format!(
                "Pitch shift {} outside +/-{} semitones",
                semitones, MAX_SEMITONE_SHIFT
            )));
        }

        let mut warnings = Vec::new();
        let ratio = tempo_ratio.clamp(MIN_TEMPO_RATIO, MAX_TEMPO_RATIO);
        if ratio != tempo_ratio {
            let warning = format!("Tempo ratio {} clamped to {}", tempo_ratio, ratio);
            log::warn!("{}", warning);
            warnings.push(warning);
        }

        if self.is_identity(ratio, semitones) || input.is_empty() {
            return Ok(StretchOutcome {
                buffer: input.clone(),
                degraded: false,
                warnings,
            });
        }

        let failure = if self.preferred.is_available() {
            match self.preferred.process(input, ratio, semitones) {
                Ok(buffer) => {
                    return Ok(StretchOutcome {
                        buffer,
                        degraded: false,
                        warnings,
                    })
                }
                Err(e) => e,
            }
        } else {
            EngineError::ProcessorUnavailable(format!("'{}' is not available", self.preferred.name()))
        };

        if !self.config.allow_fallback {
            return Err(failure);
        }

        let warning = format!(
            "{}; used lower-fidelity {} fallback",
            failure,
            self.fallback.name()
        );
        log::warn!("{}", warning);
        warnings.push(warning);

        let buffer = self.fallback.process(input, ratio, semitones)?;
        Ok(StretchOutcome {
            buffer,
            degraded: true,
            warnings,
        })
    }
}
