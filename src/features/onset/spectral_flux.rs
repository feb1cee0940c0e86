//! Spectral flux onset strength
//!
//! Onset strength at frame `t` is the mean over mel bands of the positive
//! part of `S[t] − S[t−1]`, where `S` is the log-mel spectrogram. Frame 0
//! has no predecessor and gets strength 0.

/// Compute the onset strength envelope from log-mel frames
///
/// # Arguments
///
/// * `log_mel` - Log-mel spectrogram (`[frame][band]`, decibels)
///
/// # Returns
///
/// One non-negative onset strength per frame
pub fn onset_strength(log_mel: &[Vec<f32>]) -> Vec<f32> {
    let mut envelope = Vec::with_capacity(log_mel.len());
    if log_mel.is_empty() {
        return envelope;
    }

    envelope.push(0.0);
    for pair in log_mel.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let bands = cur.len().max(1);
        let flux: f32 = cur
            .iter()
            .zip(prev.iter())
            .map(|(c, p)| (c - p).max(0.0))
            .sum();
        envelope.push(flux / bands as f32);
    }

    log::debug!("Onset envelope: {} frames", envelope.len());
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_produces_single_onset() {
        let mut frames = vec![vec![-80.0f32; 4]; 10];
        for frame in frames.iter_mut().skip(5) {
            *frame = vec![-20.0; 4];
        }
        let env = onset_strength(&frames);
        assert_eq!(env.len(), 10);
        assert_eq!(env[0], 0.0);
        assert!((env[5] - 60.0).abs() < 1e-4);
        assert!(env.iter().enumerate().all(|(i, &v)| i == 5 || v == 0.0));
    }

    #[test]
    fn test_decay_is_not_an_onset() {
        let frames = vec![vec![0.0f32; 3], vec![-10.0; 3], vec![-20.0; 3]];
        assert!(onset_strength(&frames).iter().all(|&v| v == 0.0));
    }
}
