//! Arrangement items and their validation
//!
//! Items are checked in two passes before any audio is touched: first their
//! own fields, then their source references and slice windows against the
//! store. A render never starts with an invalid item.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::stretch::MAX_SEMITONE_SHIFT;
use crate::error::EngineError;
use crate::io::AudioBuffer;
use crate::store::Store;

/// Allowed overshoot of a slice end past the source duration, in seconds
const SLICE_TOLERANCE_SECONDS: f64 = 1e-3;

fn default_loop_count() -> u32 {
    1
}

/// One slice placed on the bar grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrangementItem {
    /// Identifier of the source buffer in the store
    pub source_ref: String,

    /// Slice start in seconds
    pub slice_start: f64,

    /// Slice end in seconds
    pub slice_end: f64,

    /// Tempo of the source material
    pub source_bpm: f64,

    /// Pitch shift in semitones
    #[serde(default)]
    pub semitone_shift: f64,

    /// Bar index the item is placed at
    pub at_bar: u32,

    /// Number of back-to-back repetitions (at least 1)
    #[serde(default = "default_loop_count")]
    pub loop_count: u32,
}

impl ArrangementItem {
    fn invalid(index: usize, reason: impl Into<String>) -> EngineError {
        EngineError::InvalidArrangementItem {
            index,
            reason: reason.into(),
        }
    }

    /// Check the item's own fields
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArrangementItem` naming `index` for an
    /// empty source reference, a non-finite, negative or empty slice window,
    /// a negative or non-finite source BPM, a pitch shift that is not finite
    /// or exceeds [`MAX_SEMITONE_SHIFT`], or a loop count of zero.
    pub fn validate(&self, index: usize) -> Result<(), EngineError> {
        if self.source_ref.trim().is_empty() {
            return Err(Self::invalid(index, "missing source reference"));
        }
        if !self.slice_start.is_finite() || !self.slice_end.is_finite() {
            return Err(Self::invalid(index, "slice bounds must be finite"));
        }
        if self.slice_start < 0.0 || self.slice_end <= self.slice_start {
            return Err(Self::invalid(
                index,
                format!(
                    "slice window [{}, {}) is empty or negative",
                    self.slice_start, self.slice_end
                ),
            ));
        }
        if !self.source_bpm.is_finite() || self.source_bpm < 0.0 {
            return Err(Self::invalid(
                index,
                format!("source BPM {} is negative or not finite", self.source_bpm),
            ));
        }
        if !self.semitone_shift.is_finite() {
            return Err(Self::invalid(index, "semitone shift must be finite"));
        }
        if self.semitone_shift.abs() > MAX_SEMITONE_SHIFT {
            return Err(Self::invalid(
                index,
                format!(
                    "semitone shift {} outside +/-{}",
                    self.semitone_shift, MAX_SEMITONE_SHIFT
                ),
            ));
        }
        if self.loop_count < 1 {
            return Err(Self::invalid(index, "loop count must be at least 1"));
        }
        Ok(())
    }

    /// Slice length in seconds
    pub fn slice_seconds(&self) -> f64 {
        self.slice_end - self.slice_start
    }
}

/// Validate every item, then resolve every source
///
/// # Returns
///
/// One source buffer per item, in item order
///
/// # Errors
///
/// Returns `EngineError::InvalidArrangementItem` for the first invalid item.
/// No store lookup happens unless all items pass [`ArrangementItem::validate`].
pub fn resolve_sources(
    items: &[ArrangementItem],
    store: &dyn Store<AudioBuffer>,
) -> Result<Vec<Arc<AudioBuffer>>, EngineError> {
    for (index, item) in items.iter().enumerate() {
        item.validate(index)?;
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let source = store.get(&item.source_ref).ok_or_else(|| {
                ArrangementItem::invalid(index, format!("unknown source '{}'", item.source_ref))
            })?;
            let duration = source.duration_seconds();
            if item.slice_end > duration + SLICE_TOLERANCE_SECONDS {
                return Err(ArrangementItem::invalid(
                    index,
                    format!(
                        "slice end {:.3}s past source duration {:.3}s",
                        item.slice_end, duration
                    ),
                ));
            }
            Ok(source)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn item() -> ArrangementItem {
        ArrangementItem {
            source_ref: "src".to_string(),
            slice_start: 0.0,
            slice_end: 1.0,
            source_bpm: 120.0,
            semitone_shift: 0.0,
            at_bar: 0,
            loop_count: 1,
        }
    }

    #[test]
    fn test_valid_item() {
        assert!(item().validate(0).is_ok());
    }

    #[test]
    fn test_invalid_fields_name_the_item() {
        let cases = vec![
            ArrangementItem { loop_count: 0, ..item() },
            ArrangementItem { slice_end: 0.0, ..item() },
            ArrangementItem { slice_start: -1.0, ..item() },
            ArrangementItem { source_ref: " ".to_string(), ..item() },
            ArrangementItem { source_bpm: f64::NAN, ..item() },
            ArrangementItem { semitone_shift: f64::INFINITY, ..item() },
            ArrangementItem { semitone_shift: 600.0, ..item() },
            ArrangementItem { semitone_shift: -48.01, ..item() },
        ];
        for case in cases {
            match case.validate(3) {
                Err(EngineError::InvalidArrangementItem { index, .. }) => assert_eq!(index, 3),
                other => panic!("expected invalid item, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_four_octave_shift_is_allowed() {
        let up = ArrangementItem { semitone_shift: 48.0, ..item() };
        let down = ArrangementItem { semitone_shift: -48.0, ..item() };
        assert!(up.validate(0).is_ok());
        assert!(down.validate(0).is_ok());
    }

    #[test]
    fn test_zero_bpm_is_allowed() {
        let zero = ArrangementItem { source_bpm: 0.0, ..item() };
        assert!(zero.validate(0).is_ok());
    }

    #[test]
    fn test_resolve_checks_store_and_duration() {
        let mut store: MemoryStore<AudioBuffer> = MemoryStore::new();
        store.put("src".to_string(), AudioBuffer::from_mono(vec![0.0; 8000], 8000).unwrap());

        assert_eq!(resolve_sources(&[item()], &store).unwrap().len(), 1);

        let missing = ArrangementItem { source_ref: "other".to_string(), ..item() };
        assert!(matches!(
            resolve_sources(&[item(), missing], &store),
            Err(EngineError::InvalidArrangementItem { index: 1, .. })
        ));

        let too_long = ArrangementItem { slice_end: 2.0, ..item() };
        assert!(resolve_sources(&[too_long], &store).is_err());
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{"source_ref":"a","slice_start":0,"slice_end":4,"source_bpm":128,"at_bar":2}"#;
        let parsed: ArrangementItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.loop_count, 1);
        assert_eq!(parsed.semitone_shift, 0.0);
    }
}
