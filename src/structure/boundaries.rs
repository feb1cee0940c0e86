//! Boundary candidate selection from a novelty curve
//!
//! # Algorithm
//!
//! 1. Adaptive threshold: element-wise maximum of a median-filtered novelty
//!    curve and `relative_threshold × max(novelty)`
//! 2. Candidates: local maxima (within `±neighborhood` frames) strictly above
//!    the threshold
//! 3. Minimum gap: walking candidates in time order, a candidate closer than
//!    `min_gap_seconds` to the last kept one replaces it only if its novelty
//!    is higher
//! 4. Frame 0 and the end edge `N` are always boundaries

/// Parameters for boundary picking
#[derive(Debug, Clone, Copy)]
pub struct PeakPickParams {
    /// Fraction of the curve maximum used as the absolute threshold floor
    pub relative_threshold: f32,
    /// Median filter window (frames)
    pub median_window: usize,
    /// Half-width of the local-maximum neighbourhood (frames)
    pub neighborhood: usize,
    /// Minimum distance between kept boundaries (seconds)
    pub min_gap_seconds: f32,
}

/// Centred running median, window shrinking at the edges
pub fn median_filter(values: &[f32], window: usize) -> Vec<f32> {
    let half = window.max(1) / 2;
    let n = values.len();
    let mut scratch: Vec<f32> = Vec::with_capacity(window.max(1));
    (0..n)
        .map(|t| {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(n);
            scratch.clear();
            scratch.extend_from_slice(&values[lo..hi]);
            scratch.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let m = scratch.len();
            if m % 2 == 1 {
                scratch[m / 2]
            } else {
                0.5 * (scratch[m / 2 - 1] + scratch[m / 2])
            }
        })
        .collect()
}

/// Local maxima of `novelty` above the adaptive threshold
pub fn candidate_peaks(novelty: &[f32], params: &PeakPickParams) -> Vec<usize> {
    let n = novelty.len();
    let max = novelty.iter().copied().fold(0.0f32, f32::max);
    if n == 0 || max <= 0.0 {
        return vec![];
    }
    let floor = params.relative_threshold * max;
    let median = median_filter(novelty, params.median_window);

    (0..n)
        .filter(|&t| {
            let threshold = median[t].max(floor);
            if novelty[t] <= threshold {
                return false;
            }
            let lo = t.saturating_sub(params.neighborhood);
            let hi = (t + params.neighborhood + 1).min(n);
            novelty[lo..hi].iter().all(|&v| v <= novelty[t])
        })
        .collect()
}

/// Enforce a minimum time gap between candidates, keeping the stronger one
///
/// `times[t]` is the start time of frame `t` in seconds.
pub fn enforce_min_gap(
    peaks: &[usize],
    novelty: &[f32],
    times: &[f32],
    min_gap_seconds: f32,
) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(peaks.len());
    for &p in peaks {
        match kept.last().copied() {
            Some(last) if times[p] - times[last] < min_gap_seconds => {
                if novelty[p] > novelty[last] {
                    if let Some(slot) = kept.last_mut() {
                        *slot = p;
                    }
                }
            }
            _ => kept.push(p),
        }
    }
    kept
}

/// Pick section boundaries as sync frame indices
///
/// # Arguments
///
/// * `novelty` - Novelty curve over `N` sync frames
/// * `times` - Frame start times (at least `N` entries)
/// * `params` - Peak picking parameters
///
/// # Returns
///
/// Sorted, deduplicated edges starting at 0 and ending at `N`
pub fn pick_boundaries(novelty: &[f32], times: &[f32], params: &PeakPickParams) -> Vec<usize> {
    let n = novelty.len();
    let peaks = candidate_peaks(novelty, params);
    let kept = enforce_min_gap(&peaks, novelty, times, params.min_gap_seconds);

    let mut bounds = Vec::with_capacity(kept.len() + 2);
    bounds.push(0);
    bounds.extend(kept);
    bounds.push(n);
    bounds.sort_unstable();
    bounds.dedup();

    log::debug!(
        "Boundaries: {} candidates -> {} edges",
        peaks.len(),
        bounds.len()
    );
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(gap: f32) -> PeakPickParams {
        PeakPickParams {
            relative_threshold: 0.25,
            median_window: 5,
            neighborhood: 2,
            min_gap_seconds: gap,
        }
    }

    #[test]
    fn test_median_filter() {
        let out = median_filter(&[0.0, 10.0, 0.0, 0.0, 5.0], 3);
        assert_eq!(out, vec![5.0, 0.0, 0.0, 0.0, 2.5]);
    }

    #[test]
    fn test_peaks_above_threshold_only() {
        let mut nov = vec![0.0f32; 30];
        nov[10] = 1.0;
        nov[20] = 0.1; // below 0.25 of max
        let peaks = candidate_peaks(&nov, &params(0.0));
        assert_eq!(peaks, vec![10]);
    }

    #[test]
    fn test_min_gap_keeps_stronger() {
        let nov = vec![0.0, 0.6, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.5, 0.0];
        let times: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let kept = enforce_min_gap(&[1, 3, 8], &nov, &times, 4.0);
        assert_eq!(kept, vec![3, 8]);
    }

    #[test]
    fn test_edges_always_present() {
        let nov = vec![0.0f32; 12];
        let times: Vec<f32> = (0..12).map(|i| i as f32).collect();
        assert_eq!(pick_boundaries(&nov, &times, &params(3.0)), vec![0, 12]);
    }
}
