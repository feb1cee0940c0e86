//! Dynamic-programming beat tracker
//!
//! Finds the beat sequence that best balances two goals: beats should land on
//! strong onsets, and consecutive beats should be close to the global beat
//! period.
//!
//! # Algorithm
//!
//! 1. Normalise the onset envelope by its standard deviation and smooth it
//!    with a Gaussian window one period wide (the local score)
//! 2. Forward pass: for every frame `t`, look back over `[t − 2P, t − P/2]`
//!    and take the predecessor maximising
//!    `cumscore[prev] − tightness · ln((t − prev) / P)²`
//! 3. Backtrack from the best cumulative score within the final period
//! 4. Drop weak beats at both ends of the sequence
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use crate::error::EngineError;

const EPSILON: f32 = 1e-10;

/// Track beats through an onset envelope
///
/// # Arguments
///
/// * `onset_envelope` - Onset strength, one value per frame
/// * `period_frames` - Beat period in frames (from tempo estimation)
/// * `tightness` - How strongly to hold the period (default: 100.0)
///
/// # Returns
///
/// Beat positions as frame indices, strictly increasing
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` if the period is not positive.
pub fn track_beats(
    onset_envelope: &[f32],
    period_frames: f32,
    tightness: f32,
) -> Result<Vec<usize>, EngineError> {
    if !(period_frames > 0.0) || !period_frames.is_finite() {
        return Err(EngineError::InvalidInput(format!(
            "Invalid beat period: {}",
            period_frames
        )));
    }

    let n = onset_envelope.len();
    if n == 0 {
        return Ok(vec![]);
    }

    // Step 1: Local score
    let mean = onset_envelope.iter().sum::<f32>() / n as f32;
    let var = onset_envelope
        .iter()
        .map(|&x| (x - mean) * (x - mean))
        .sum::<f32>()
        / n as f32;
    let std = var.sqrt();
    if std <= EPSILON {
        log::debug!("Onset envelope has no variation, no beats");
        return Ok(vec![]);
    }
    let normalised: Vec<f32> = onset_envelope.iter().map(|&x| x / std).collect();
    let local_score = gaussian_smooth(&normalised, period_frames);

    // Step 2: Forward pass
    let max_local = local_score.iter().copied().fold(0.0f32, f32::max);
    let score_threshold = 0.01 * max_local;
    let far = (2.0 * period_frames).round() as usize;
    let near = ((period_frames / 2.0).round() as usize).max(1);

    let mut cumscore = vec![0.0f32; n];
    let mut backlink: Vec<Option<usize>> = vec![None; n];
    let mut first_beat = true;

    for t in 0..n {
        let mut best: Option<(usize, f32)> = None;
        if t >= near {
            let lo = t.saturating_sub(far);
            let hi = t - near;
            for prev in lo..=hi {
                let interval = (t - prev) as f32 / period_frames;
                let penalty = interval.ln();
                let candidate = cumscore[prev] - tightness * penalty * penalty;
                if best.map_or(true, |(_, s)| candidate > s) {
                    best = Some((prev, candidate));
                }
            }
        }

        let carried = best.map(|(_, s)| s).unwrap_or(0.0);
        cumscore[t] = local_score[t] + carried;

        if first_beat && local_score[t] < score_threshold {
            backlink[t] = None;
        } else {
            backlink[t] = best.map(|(p, _)| p);
            first_beat = false;
        }
    }

    // Step 3: Backtrack from the best frame within the last period
    let tail_start = n.saturating_sub(period_frames.round() as usize + 1);
    let mut last = tail_start;
    for t in tail_start..n {
        if cumscore[t] > cumscore[last] {
            last = t;
        }
    }

    let mut beats = vec![last];
    let mut cursor = last;
    while let Some(prev) = backlink[cursor] {
        beats.push(prev);
        cursor = prev;
    }
    beats.reverse();

    // Step 4: Trim weak edge beats
    let trimmed = trim_beats(&local_score, beats);
    log::debug!(
        "Tracked {} beats (period {:.2} frames)",
        trimmed.len(),
        period_frames
    );
    Ok(trimmed)
}

/// Convolve with a Gaussian window spanning one period on each side
fn gaussian_smooth(signal: &[f32], period: f32) -> Vec<f32> {
    let half = period.round().max(1.0) as isize;
    let kernel: Vec<f32> = (-half..=half)
        .map(|i| {
            let x = i as f32 * 32.0 / period;
            (-0.5 * x * x).exp()
        })
        .collect();

    let n = signal.len() as isize;
    (0..n)
        .map(|t| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(k, w)| {
                    let idx = t + k as isize - half;
                    (idx >= 0 && idx < n).then(|| signal[idx as usize] * w)
                })
                .sum()
        })
        .collect()
}

/// Remove leading and trailing beats whose local score is below half the
/// RMS local score of all beats
fn trim_beats(local_score: &[f32], beats: Vec<usize>) -> Vec<usize> {
    if beats.is_empty() {
        return beats;
    }
    let rms = (beats
        .iter()
        .map(|&b| local_score[b] * local_score[b])
        .sum::<f32>()
        / beats.len() as f32)
        .sqrt();
    let threshold = 0.5 * rms;

    let start = beats
        .iter()
        .position(|&b| local_score[b] >= threshold)
        .unwrap_or(beats.len());
    let end = beats
        .iter()
        .rposition(|&b| local_score[b] >= threshold)
        .map(|i| i + 1)
        .unwrap_or(start);

    if start >= end {
        return vec![];
    }
    beats[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_click_envelope(n: usize, period: usize, offset: usize) -> Vec<f32> {
        (0..n)
            .map(|i| if i >= offset && (i - offset) % period == 0 { 1.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_tracks_regular_clicks() {
        let env = generate_click_envelope(600, 20, 5);
        let beats = track_beats(&env, 20.0, 100.0).unwrap();
        assert!(beats.len() >= 25, "only {} beats", beats.len());
        for pair in beats.windows(2) {
            assert_eq!(pair[1] - pair[0], 20);
        }
        for &b in &beats {
            assert_eq!((b - 5) % 20, 0, "beat {} off the click grid", b);
        }
    }

    #[test]
    fn test_silent_envelope_has_no_beats() {
        let beats = track_beats(&[0.0; 300], 20.0, 100.0).unwrap();
        assert!(beats.is_empty());
    }

    #[test]
    fn test_rejects_zero_period() {
        assert!(track_beats(&[1.0; 10], 0.0, 100.0).is_err());
    }
}
