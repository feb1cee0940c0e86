//! External high-quality stretch processor (Rubber Band command line)
//!
//! The slice is written to a temporary float WAV, the processor is run as a
//! blocking child process, and its output WAV is read back. Whether the
//! program can be run at all is probed once per program name and cached for
//! the life of the process.

use std::collections::HashMap;
use std::process::Command;
use std::sync::{Mutex, OnceLock};

use super::stretch::StretchStrategy;
use crate::error::EngineError;
use crate::io::wav::{read_wav, write_wav_f32};
use crate::io::AudioBuffer;

static PROBE_CACHE: OnceLock<Mutex<HashMap<String, bool>>> = OnceLock::new();

/// Run `program --version` once and remember whether it started
fn probe_program(program: &str) -> bool {
    let cache = PROBE_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = match cache.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *cache.entry(program.to_string()).or_insert_with(|| {
        let available = Command::new(program)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false);
        log::debug!("Probed '{}': available = {}", program, available);
        available
    })
}

/// Command-line arguments for a stretch, identity parameters omitted
pub fn processor_args(
    tempo_ratio: f64,
    semitones: f64,
    ratio_tolerance: f64,
    semitone_tolerance: f64,
) -> Vec<String> {
    let mut args = Vec::new();
    if (tempo_ratio - 1.0).abs() > ratio_tolerance {
        args.push("--tempo".to_string());
        args.push(format!("{:.6}", tempo_ratio));
    }
    if semitones.abs() > semitone_tolerance {
        args.push("--pitch".to_string());
        args.push(format!("{:.4}", semitones));
    }
    args
}

/// Rubber Band command-line processor
#[derive(Debug, Clone)]
pub struct RubberbandProcessor {
    program: String,
    ratio_tolerance: f64,
    semitone_tolerance: f64,
}

impl RubberbandProcessor {
    /// Processor invoking `program`
    pub fn new(program: impl Into<String>, ratio_tolerance: f64, semitone_tolerance: f64) -> Self {
        Self {
            program: program.into(),
            ratio_tolerance,
            semitone_tolerance,
        }
    }
}

impl StretchStrategy for RubberbandProcessor {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        probe_program(&self.program)
    }

    fn process(
        &self,
        input: &AudioBuffer,
        tempo_ratio: f64,
        semitones: f64,
    ) -> Result<AudioBuffer, EngineError> {
        let dir = tempfile::tempdir()?;
        let in_path = dir.path().join("in.wav");
        let out_path = dir.path().join("out.wav");
        write_wav_f32(&in_path, input)?;

        let args = processor_args(tempo_ratio, semitones, self.ratio_tolerance, self.semitone_tolerance);
        log::debug!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .arg(&in_path)
            .arg(&out_path)
            .output()
            .map_err(|e| {
                EngineError::ProcessorUnavailable(format!("Failed to run '{}': {}", self.program, e))
            })?;

        if !output.status.success() {
            return Err(EngineError::ProcessorUnavailable(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let result = read_wav(&out_path)
            .map_err(|e| EngineError::ProcessorUnavailable(format!("Unreadable processor output: {}", e)))?;
        if result.sample_rate() != input.sample_rate() {
            return result.resample(input.sample_rate());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_skip_identity_parameters() {
        assert!(processor_args(1.0, 0.0, 1e-6, 1e-3).is_empty());
        assert_eq!(
            processor_args(1.25, 0.0, 1e-6, 1e-3),
            vec!["--tempo".to_string(), "1.250000".to_string()]
        );
        assert_eq!(
            processor_args(1.0, -2.0, 1e-6, 1e-3),
            vec!["--pitch".to_string(), "-2.0000".to_string()]
        );
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let processor = RubberbandProcessor::new("mixgrid-no-such-program", 1e-6, 1e-3);
        assert!(!processor.is_available());

        let input = AudioBuffer::from_mono(vec![0.0; 4410], 44100).unwrap();
        let result = processor.process(&input, 1.5, 0.0);
        assert!(matches!(result, Err(EngineError::ProcessorUnavailable(_))));
    }
}
