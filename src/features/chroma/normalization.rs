//! Chroma normalization strategies

const EPSILON: f32 = 1e-10;

/// Sharpen chroma vector to emphasize prominent semitones
///
/// # Arguments
///
/// * `chroma` - 12-element chroma vector
/// * `power` - Sharpening power (1.0 = unchanged shape, 2.0 = squared)
///
/// # Returns
///
/// Sharpened chroma vector (L2 normalized). An all-zero vector stays zero.
pub fn sharpen_chroma(chroma: &[f32], power: f32) -> Vec<f32> {
    let sharpened: Vec<f32> = chroma.iter().map(|&v| v.max(0.0).powf(power)).collect();
    l2_normalize(&sharpened)
}

/// Scale a vector to unit Euclidean length (zero vectors are returned as is)
pub fn l2_normalize(values: &[f32]) -> Vec<f32> {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= EPSILON {
        return values.to_vec();
    }
    values.iter().map(|v| v / norm).collect()
}
