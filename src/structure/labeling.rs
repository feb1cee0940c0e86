//! Musical section naming
//!
//! Segments arrive with letter identifiers from clustering; a
//! [`SectionLabeler`] turns them into names. The default
//! [`RepetitionLabeler`] uses recurrence and position:
//!
//! - first segment shorter than `intro_max_seconds` → "Intro"
//! - last segment longer than `outro_min_seconds` → "Outro"
//! - the most recurring letter (at least two occurrences) → "Chorus"
//! - a letter that occurs once, away from the track edges → "Bridge"
//! - everything else → "Verse 1", "Verse 2", ...
//!
//! The rules are applied in that order; the first match wins.

/// A clustered segment awaiting a name
#[derive(Debug, Clone, PartialEq)]
pub struct LetteredSegment {
    /// Start time in seconds
    pub start: f32,
    /// End time in seconds
    pub end: f32,
    /// Cluster letter (A, B, ..., AA, ...)
    pub letter: String,
}

impl LetteredSegment {
    /// Segment length in seconds
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

/// Policy that names clustered segments
///
/// Implementations must return exactly one label per input segment.
pub trait SectionLabeler {
    /// Name every segment, in order
    fn label(&self, segments: &[LetteredSegment]) -> Vec<String>;
}

/// Recurrence and position heuristic
#[derive(Debug, Clone, Copy)]
pub struct RepetitionLabeler {
    /// A first segment shorter than this becomes the Intro
    pub intro_max_seconds: f32,
    /// A last segment longer than this becomes the Outro
    pub outro_min_seconds: f32,
}

impl Default for RepetitionLabeler {
    fn default() -> Self {
        Self {
            intro_max_seconds: 30.0,
            outro_min_seconds: 10.0,
        }
    }
}

impl RepetitionLabeler {
    /// Build from the segmentation settings
    pub fn from_config(config: &crate::config::SegmentationConfig) -> Self {
        Self {
            intro_max_seconds: config.intro_max_seconds,
            outro_min_seconds: config.outro_min_seconds,
        }
    }
}

impl SectionLabeler for RepetitionLabeler {
    fn label(&self, segments: &[LetteredSegment]) -> Vec<String> {
        // Occurrence counts in order of first appearance
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for seg in segments {
            match counts.iter_mut().find(|(l, _)| *l == seg.letter) {
                Some((_, c)) => *c += 1,
                None => counts.push((seg.letter.as_str(), 1)),
            }
        }

        // Most recurring letter; ties go to the earliest
        let chorus = counts
            .iter()
            .fold(None::<(&str, usize)>, |best, &(l, c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((l, c)),
            })
            .filter(|&(_, c)| c >= 2)
            .map(|(l, _)| l);

        let count_of = |letter: &str| {
            counts
                .iter()
                .find(|(l, _)| *l == letter)
                .map(|&(_, c)| c)
                .unwrap_or(0)
        };

        let last = segments.len().saturating_sub(1);
        let mut verse = 0usize;
        segments
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                if i == 0 && seg.duration() < self.intro_max_seconds {
                    "Intro".to_string()
                } else if i == last && seg.duration() > self.outro_min_seconds {
                    "Outro".to_string()
                } else if chorus == Some(seg.letter.as_str()) {
                    "Chorus".to_string()
                } else if count_of(&seg.letter) == 1 && i != 0 && i != last {
                    "Bridge".to_string()
                } else {
                    verse += 1;
                    format!("Verse {}", verse)
                }
            })
            .collect()
    }
}
