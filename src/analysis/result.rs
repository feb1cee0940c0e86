//! Analysis result types

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::metadata::AnalysisMetadata;
use crate::error::EngineError;

/// Allowed gap or overlap between adjacent sections, and between the
/// section span and `[0, duration]`, in seconds
pub const SECTION_TOLERANCE: f32 = 1e-3;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Musical key
///
/// Serialises as its name ("C", "F#m", "unknown").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
    /// No usable tonal information (silence, noise)
    Unknown,
}

impl Key {
    /// Get key name in musical notation (e.g., "C", "Am", "F#", "D#m")
    ///
    /// Returns standard musical notation:
    /// - Major keys: note name only (e.g., "C", "C#", "D", "F#")
    /// - Minor keys: note name + "m" (e.g., "Am", "C#m", "Dm", "F#m")
    /// - Unknown: "unknown"
    ///
    /// # Example
    ///
    /// ```
    /// use mixgrid_dsp::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(6).name(), "F#");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// assert_eq!(Key::Unknown.name(), "unknown");
    /// ```
    pub fn name(&self) -> String {
        match self {
            Key::Major(i) => NOTE_NAMES[*i as usize % 12].to_string(),
            Key::Minor(i) => format!("{}m", NOTE_NAMES[*i as usize % 12]),
            Key::Unknown => "unknown".to_string(),
        }
    }

    /// Parse a key name
    ///
    /// Accepts sharp or flat spellings with an optional trailing "m" for
    /// minor, and "unknown" (any case).
    ///
    /// # Example
    ///
    /// ```
    /// use mixgrid_dsp::analysis::result::Key;
    ///
    /// assert_eq!(Key::from_name("F#m"), Some(Key::Minor(6)));
    /// assert_eq!(Key::from_name("Bb"), Some(Key::Major(10)));
    /// assert_eq!(Key::from_name("H"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("unknown") {
            return Some(Key::Unknown);
        }
        let (note, minor) = match name.strip_suffix('m') {
            Some(note) => (note, true),
            None => (name, false),
        };
        let root = NOTE_NAMES
            .iter()
            .position(|&n| n == note)
            .or_else(|| FLAT_NAMES.iter().position(|&n| n == note))? as u32;
        Some(if minor {
            Key::Minor(root)
        } else {
            Key::Major(root)
        })
    }

    /// True for `Key::Unknown`
    pub fn is_unknown(&self) -> bool {
        matches!(self, Key::Unknown)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Key::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid key name '{}'", name)))
    }
}

/// A labelled structural section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section name ("Intro", "Verse 1", "Chorus", ...)
    pub label: String,

    /// Start time in seconds
    pub start: f32,

    /// End time in seconds (greater than `start`)
    pub end: f32,

    /// Boundary confidence (0.0-1.0); 0.0 for fallback sections
    pub confidence: f32,

    /// Cluster letter the label was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
}

impl Section {
    /// Section length in seconds
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

/// Complete analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// BPM estimate (120.0 when no pulse was found, see metadata flags)
    pub bpm: f32,

    /// Detected key
    pub key: Key,

    /// Key confidence (0.0-1.0)
    pub key_confidence: f32,

    /// Audio duration in seconds
    pub duration: f32,

    /// Sections sorted by start, covering `[0, duration]`
    pub sections: Vec<Section>,

    /// Beat times in seconds (empty when beat tracking failed)
    #[serde(default)]
    pub beats: Vec<f32>,

    /// Analysis metadata
    #[serde(default)]
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Build a validated result
    ///
    /// # Errors
    ///
    /// See [`AnalysisResult::validate`].
    pub fn new(
        bpm: f32,
        key: Key,
        duration: f32,
        sections: Vec<Section>,
    ) -> Result<Self, EngineError> {
        let result = Self {
            bpm,
            key,
            key_confidence: 0.0,
            duration,
            sections,
            beats: vec![],
            metadata: AnalysisMetadata::default(),
        };
        result.validate()?;
        Ok(result)
    }

    /// Check the result's invariants
    ///
    /// # Errors
    ///
    /// - `EngineError::NumericalError` if bpm is not positive and finite, the
    ///   duration is negative or not finite, or a section time is not finite
    /// - `EngineError::InvalidInput` if sections are empty-length, out of
    ///   order, overlapping, leave gaps, or do not span `[0, duration]`
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(EngineError::NumericalError(format!(
                "BPM must be positive and finite, got {}",
                self.bpm
            )));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(EngineError::NumericalError(format!(
                "Duration must be non-negative and finite, got {}",
                self.duration
            )));
        }
        if !(0.0..=1.0).contains(&self.key_confidence) {
            return Err(EngineError::InvalidInput(format!(
                "Key confidence {} outside [0, 1]",
                self.key_confidence
            )));
        }

        for (i, s) in self.sections.iter().enumerate() {
            if !s.start.is_finite() || !s.end.is_finite() {
                return Err(EngineError::NumericalError(format!(
                    "Section {} has non-finite bounds",
                    i
                )));
            }
            if s.start >= s.end {
                return Err(EngineError::InvalidInput(format!(
                    "Section {} '{}' has start {} >= end {}",
                    i, s.label, s.start, s.end
                )));
            }
            if !(0.0..=1.0).contains(&s.confidence) {
                return Err(EngineError::InvalidInput(format!(
                    "Section {} confidence {} outside [0, 1]",
                    i, s.confidence
                )));
            }
        }
        for (i, w) in self.sections.windows(2).enumerate() {
            if (w[1].start - w[0].end).abs() > SECTION_TOLERANCE {
                return Err(EngineError::InvalidInput(format!(
                    "Sections {} and {} are not contiguous ({} vs {})",
                    i,
                    i + 1,
                    w[0].end,
                    w[1].start
                )));
            }
        }
        if let (Some(first), Some(last)) = (self.sections.first(), self.sections.last()) {
            if first.start.abs() > SECTION_TOLERANCE
                || (last.end - self.duration).abs() > SECTION_TOLERANCE
            {
                return Err(EngineError::InvalidInput(format!(
                    "Sections span [{}, {}], expected [0, {}]",
                    first.start, last.end, self.duration
                )));
            }
        }
        Ok(())
    }

    /// Serialise to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::ProcessingError(format!("JSON serialisation failed: {}", e)))
    }

    /// Parse and validate a JSON result
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let result: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidInput(format!("Invalid analysis JSON: {}", e)))?;
        result.validate()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(label: &str, start: f32, end: f32) -> Section {
        Section {
            label: label.to_string(),
            start,
            end,
            confidence: 0.5,
            cluster: None,
        }
    }

    #[test]
    fn test_key_name_major() {
        assert_eq!(Key::Major(0).name(), "C");
        assert_eq!(Key::Major(1).name(), "C#");
        assert_eq!(Key::Major(6).name(), "F#");
        assert_eq!(Key::Major(11).name(), "B");
    }

    #[test]
    fn test_key_name_minor() {
        assert_eq!(Key::Minor(0).name(), "Cm");
        assert_eq!(Key::Minor(9).name(), "Am");
        assert_eq!(Key::Minor(11).name(), "Bm");
    }

    #[test]
    fn test_key_name_roundtrip() {
        for i in 0..12 {
            assert_eq!(Key::from_name(&Key::Major(i).name()), Some(Key::Major(i)));
            assert_eq!(Key::from_name(&Key::Minor(i).name()), Some(Key::Minor(i)));
        }
        assert_eq!(Key::from_name("UNKNOWN"), Some(Key::Unknown));
        assert_eq!(Key::from_name("Ebm"), Some(Key::Minor(3)));
        assert_eq!(Key::from_name(""), None);
        assert_eq!(Key::from_name("m"), None);
    }

    #[test]
    fn test_key_serialises_as_name() {
        assert_eq!(serde_json::to_string(&Key::Minor(6)).unwrap(), "\"F#m\"");
        let key: Key = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(key, Key::Unknown);
        assert!(serde_json::from_str::<Key>("\"X#\"").is_err());
    }

    #[test]
    fn test_valid_result() {
        let result = AnalysisResult::new(
            128.0,
            Key::Minor(9),
            60.0,
            vec![section("Intro", 0.0, 20.0), section("Chorus", 20.0, 60.0)],
        )
        .unwrap();
        assert_eq!(result.sections.len(), 2);
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(matches!(
            AnalysisResult::new(0.0, Key::Unknown, 10.0, vec![]),
            Err(EngineError::NumericalError(_))
        ));
        assert!(matches!(
            AnalysisResult::new(f32::NAN, Key::Unknown, 10.0, vec![]),
            Err(EngineError::NumericalError(_))
        ));
        assert!(matches!(
            AnalysisResult::new(120.0, Key::Unknown, -1.0, vec![]),
            Err(EngineError::NumericalError(_))
        ));
    }

    #[test]
    fn test_rejects_broken_sections() {
        // Gap
        assert!(AnalysisResult::new(
            120.0,
            Key::Unknown,
            30.0,
            vec![section("A", 0.0, 10.0), section("B", 12.0, 30.0)]
        )
        .is_err());
        // Overlap
        assert!(AnalysisResult::new(
            120.0,
            Key::Unknown,
            30.0,
            vec![section("A", 0.0, 15.0), section("B", 10.0, 30.0)]
        )
        .is_err());
        // Short of the duration
        assert!(AnalysisResult::new(120.0, Key::Unknown, 30.0, vec![section("A", 0.0, 20.0)]).is_err());
        // Empty section
        assert!(AnalysisResult::new(120.0, Key::Unknown, 0.0, vec![section("A", 0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_json_shape() {
        let result = AnalysisResult::new(
            100.0,
            Key::Major(2),
            8.0,
            vec![section("Verse 1", 0.0, 8.0)],
        )
        .unwrap();
        let json = result.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["key"], "D");
        assert_eq!(value["sections"][0]["label"], "Verse 1");
        assert!(value["sections"][0].get("cluster").is_none());

        let parsed = AnalysisResult::from_json(&json).unwrap();
        assert_eq!(parsed.sections, result.sections);
    }
}
