//! Error types for the analysis and rendering engine

use std::fmt;

/// Errors that can occur during analysis or rendering
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Audio decoding error
    DecodingError(String),

    /// Processing error during analysis or rendering
    ProcessingError(String),

    /// Numerical error (NaN/Inf samples, negative durations, ...)
    NumericalError(String),

    /// The external time/pitch processor is missing or failed
    ProcessorUnavailable(String),

    /// An arrangement item was rejected before rendering started
    InvalidArrangementItem {
        /// Position of the item in the request (0-based)
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// I/O error
    IoError(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            EngineError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            EngineError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            EngineError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            EngineError::ProcessorUnavailable(msg) => {
                write!(f, "Time/pitch processor unavailable: {}", msg)
            }
            EngineError::InvalidArrangementItem { index, reason } => {
                write!(f, "Invalid arrangement item #{}: {}", index, reason)
            }
            EngineError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

impl From<hound::Error> for EngineError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => EngineError::IoError(e.to_string()),
            other => EngineError::DecodingError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_faulty_item() {
        let err = EngineError::InvalidArrangementItem {
            index: 2,
            reason: "loop count must be >= 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid arrangement item #2: loop count must be >= 1"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.wav");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::IoError(_)));
        assert!(err.to_string().contains("missing.wav"));
    }
}
