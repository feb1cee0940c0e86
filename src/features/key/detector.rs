//! Key detection algorithm
//!
//! Matches the time-averaged chroma profile against the 24 Krumhansl-Kessler
//! templates using Pearson correlation.
//!
//! Majors are scored before minors and a later key must beat the current best
//! strictly, so exact ties resolve to the major key. A profile with no energy
//! or no variation across pitch classes has no defined correlation and yields
//! [`Key::Unknown`].

use super::{compute_key_clarity, templates::KeyTemplates, KeyDetectionResult};
use crate::analysis::result::Key;
use crate::error::EngineError;

const EPSILON: f32 = 1e-10;

/// Detect musical key from chroma vectors
///
/// # Arguments
///
/// * `chroma_vectors` - Vector of 12-element chroma vectors (one per frame)
/// * `templates` - Key templates (Krumhansl-Kessler profiles)
///
/// # Returns
///
/// Key detection result with:
/// - Detected key (major or minor, 0-11, or `Key::Unknown`)
/// - Confidence score (0.0-1.0)
/// - Clarity score (0.0-1.0)
/// - All 24 key scores (ranked)
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` if a chroma vector does not have 12
/// elements.
pub fn detect_key(
    chroma_vectors: &[Vec<f32>],
    templates: &KeyTemplates,
) -> Result<KeyDetectionResult, EngineError> {
    log::debug!("Detecting key from {} chroma vectors", chroma_vectors.len());

    for (i, chroma) in chroma_vectors.iter().enumerate() {
        if chroma.len() != 12 {
            return Err(EngineError::InvalidInput(format!(
                "Chroma vector at index {} has {} elements, expected 12",
                i,
                chroma.len()
            )));
        }
    }

    // Step 1: Average chroma over time
    let profile = average_chroma(chroma_vectors);
    let total: f32 = profile.iter().sum();
    let mean = total / 12.0;
    let spread: f32 = profile.iter().map(|v| (v - mean) * (v - mean)).sum();

    if total <= EPSILON || spread <= EPSILON {
        log::debug!("Degenerate chroma profile, key unknown");
        return Ok(KeyDetectionResult::unknown());
    }

    // Step 2: Correlate against every template, majors first
    let mut scores: Vec<(Key, f32)> = Vec::with_capacity(24);
    for (root, template) in templates.major.iter().enumerate() {
        scores.push((Key::Major(root as u32), pearson(&profile, template)));
    }
    for (root, template) in templates.minor.iter().enumerate() {
        scores.push((Key::Minor(root as u32), pearson(&profile, template)));
    }

    // Step 3: Strictly-greater argmax keeps the first (major) key on ties
    let mut best = 0usize;
    for (i, (_, score)) in scores.iter().enumerate() {
        if *score > scores[best].1 {
            best = i;
        }
    }
    let (key, best_score) = scores[best];

    let clarity = compute_key_clarity(&scores);

    // Stable sort keeps majors ahead of equal-scoring minors
    let mut ranked = scores;
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    log::debug!(
        "Detected key {} (r={:.3}, clarity={:.3})",
        key.name(),
        best_score,
        clarity
    );

    Ok(KeyDetectionResult {
        key,
        confidence: best_score.clamp(0.0, 1.0),
        clarity,
        all_scores: ranked,
    })
}

/// Average chroma vectors element-wise (zeros for empty input)
pub(crate) fn average_chroma(chroma_vectors: &[Vec<f32>]) -> [f32; 12] {
    let mut avg = [0.0f32; 12];
    if chroma_vectors.is_empty() {
        return avg;
    }
    for chroma in chroma_vectors {
        for (a, v) in avg.iter_mut().zip(chroma.iter()) {
            *a += v;
        }
    }
    let n = chroma_vectors.len() as f32;
    avg.iter_mut().for_each(|a| *a /= n);
    avg
}

/// Pearson correlation of two 12-element vectors
fn pearson(a: &[f32; 12], b: &[f32; 12]) -> f32 {
    let mean_a = a.iter().sum::<f32>() / 12.0;
    let mean_b = b.iter().sum::<f32>() / 12.0;
    let mut cov = 0.0f32;
    let mut var_a = 0.0f32;
    let mut var_b = 0.0f32;
    for i in 0..12 {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    if denom <= EPSILON {
        0.0
    } else {
        cov / denom
    }
}
