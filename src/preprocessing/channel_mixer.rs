//! Channel mixing utilities (downmix, interleave, deinterleave)

/// Average interleaved channels down to mono
///
/// # Arguments
///
/// * `samples` - Interleaved samples
/// * `channels` - Number of interleaved channels
///
/// # Returns
///
/// Mono samples, one per frame
pub fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Split interleaved samples into one vector per channel
pub fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    if channels <= 1 {
        return vec![samples.to_vec()];
    }
    let frames = samples.len() / channels;
    let mut out = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (ch, &s) in frame.iter().enumerate() {
            out[ch].push(s);
        }
    }
    out
}

/// Interleave per-channel vectors
///
/// Channels shorter than the first are padded with silence.
pub fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    if channels.is_empty() {
        return vec![];
    }
    let frames = channels[0].len();
    let mut out = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        for channel in channels {
            out.push(channel.get(i).copied().unwrap_or(0.0));
        }
    }
    out
}
