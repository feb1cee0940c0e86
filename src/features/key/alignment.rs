//! Key alignment between a detected key and a project key

use crate::analysis::result::Key;

/// Minimal signed semitone shift that moves `from` onto `to`
///
/// The result lies in `-5..=6`. When the modes differ, a minor key is
/// compared through its relative major (root + 3). Either key being
/// `Key::Unknown` yields 0 (no shift).
///
/// # Example
///
/// ```
/// use mixgrid_dsp::analysis::result::Key;
/// use mixgrid_dsp::features::key::alignment::semitone_delta;
///
/// assert_eq!(semitone_delta(Key::Major(0), Key::Major(2)), 2);   // C -> D
/// assert_eq!(semitone_delta(Key::Major(0), Key::Major(7)), -5);  // C -> G
/// assert_eq!(semitone_delta(Key::Minor(9), Key::Major(0)), 0);   // Am -> C
/// ```
pub fn semitone_delta(from: Key, to: Key) -> i32 {
    let (from_root, to_root) = match (from, to) {
        (Key::Unknown, _) | (_, Key::Unknown) => return 0,
        (Key::Major(a), Key::Major(b)) | (Key::Minor(a), Key::Minor(b)) => (a, b),
        (Key::Minor(a), Key::Major(b)) => (a + 3, b),
        (Key::Major(a), Key::Minor(b)) => (a, b + 3),
    };

    let diff = (to_root as i32 - from_root as i32).rem_euclid(12);
    if diff > 6 {
        diff - 12
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_range() {
        for a in 0..12 {
            for b in 0..12 {
                let d = semitone_delta(Key::Major(a), Key::Major(b));
                assert!((-5..=6).contains(&d));
                assert_eq!((a as i32 + d).rem_euclid(12), b as i32);
            }
        }
    }

    #[test]
    fn test_tritone_is_positive() {
        assert_eq!(semitone_delta(Key::Minor(0), Key::Minor(6)), 6);
    }

    #[test]
    fn test_unknown_means_no_shift() {
        assert_eq!(semitone_delta(Key::Unknown, Key::Major(5)), 0);
        assert_eq!(semitone_delta(Key::Minor(2), Key::Unknown), 0);
    }

    #[test]
    fn test_mixed_modes_use_relative_major() {
        // Em (relative G) -> D major: G -> D is -5
        assert_eq!(semitone_delta(Key::Minor(4), Key::Major(2)), -5);
    }
}
