//! Sample-rate conversion by 4-point Hermite interpolation

/// Linear interpolation resampling to exactly `output_len` samples
pub fn resample_linear(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() == 1 {
        return vec![input[0]; output_len];
    }

    let ratio = (input.len() - 1) as f64 / (output_len.max(2) - 1) as f64;
    (0..output_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;
            if idx + 1 < input.len() {
                input[idx] * (1.0 - frac) + input[idx + 1] * frac
            } else {
                input[input.len() - 1]
            }
        })
        .collect()
}

/// Cubic (Hermite) resampling to exactly `output_len` samples
///
/// Inputs shorter than four samples fall back to linear interpolation.
pub fn resample_cubic(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() < 4 {
        return resample_linear(input, output_len);
    }
    if output_len == input.len() {
        return input.to_vec();
    }

    let last = input.len() - 1;
    let ratio = last as f64 / (output_len.max(2) - 1) as f64;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let pos = i as f64 * ratio;
        let idx = (pos as usize).min(last);
        let frac = (pos - idx as f64) as f32;

        let s0 = input[idx.saturating_sub(1)];
        let s1 = input[idx];
        let s2 = input[(idx + 1).min(last)];
        let s3 = input[(idx + 2).min(last)];

        let c0 = s1;
        let c1 = 0.5 * (s2 - s0);
        let c2 = s0 - 2.5 * s1 + 2.0 * s2 - 0.5 * s3;
        let c3 = 0.5 * (s3 - s0) + 1.5 * (s1 - s2);

        output.push(((c3 * frac + c2) * frac + c1) * frac + c0);
    }

    output
}

/// Resample a mono signal from one rate to another
pub fn resample_to_rate(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 {
        return input.to_vec();
    }
    let out_len = (input.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    resample_cubic(input, out_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_cubic_exact_length() {
        let input: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.01).sin()).collect();
        assert_eq!(resample_cubic(&input, 500).len(), 500);
        assert_eq!(resample_cubic(&input, 2000).len(), 2000);
    }

    #[test]
    fn test_resample_cubic_keeps_endpoints() {
        let input: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let out = resample_cubic(&input, 37);
        assert!((out[0] - 0.0).abs() < 1e-4);
        assert!((out[36] - 99.0).abs() < 1e-3);
    }

    #[test]
    fn test_resample_to_rate_halves() {
        let input = vec![0.0f32; 44100];
        assert_eq!(resample_to_rate(&input, 44100, 22050).len(), 22050);
    }
}
