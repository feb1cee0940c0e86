//! Beat-synchronous feature stacking
//!
//! Frame-level feature blocks (chroma, MFCC, ΔMFCC, Δ²MFCC, tempogram) are
//! averaged between consecutive beats, each block is L2-normalised per sync
//! frame, the blocks are concatenated, and every resulting dimension is
//! standardised to zero mean and unit variance over time.

const EPSILON: f32 = 1e-10;

/// Sync frame edges: `[0, beats..., n_frames]`, sorted and deduplicated
///
/// Beat frames at or past `n_frames` are dropped. Sync frame `k` spans
/// `edges[k]..edges[k + 1]`.
pub fn sync_edges(beat_frames: &[usize], n_frames: usize) -> Vec<usize> {
    let mut edges = Vec::with_capacity(beat_frames.len() + 2);
    edges.push(0);
    edges.extend(beat_frames.iter().copied().filter(|&b| b < n_frames));
    edges.push(n_frames);
    edges.sort_unstable();
    edges.dedup();
    edges
}

/// Mean of `frames` within each sync span
///
/// Frames past the end of `frames` are ignored; a span with no frames
/// yields zeros.
pub fn sync_mean(frames: &[Vec<f32>], edges: &[usize]) -> Vec<Vec<f32>> {
    let dims = frames.first().map(|f| f.len()).unwrap_or(0);
    edges
        .windows(2)
        .map(|span| {
            let lo = span[0].min(frames.len());
            let hi = span[1].min(frames.len());
            let mut acc = vec![0.0f32; dims];
            if hi > lo {
                for frame in &frames[lo..hi] {
                    for (a, v) in acc.iter_mut().zip(frame.iter()) {
                        *a += v;
                    }
                }
                let count = (hi - lo) as f32;
                acc.iter_mut().for_each(|a| *a /= count);
            }
            acc
        })
        .collect()
}

/// L2-normalise every row (rows with zero norm are left as zeros)
pub fn normalize_rows(rows: &mut [Vec<f32>]) {
    for row in rows.iter_mut() {
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > EPSILON {
            row.iter_mut().for_each(|v| *v /= norm);
        }
    }
}

/// Standardise each column to zero mean and unit variance
///
/// Columns with zero variance become all zeros.
pub fn standardize_columns(rows: &mut [Vec<f32>]) {
    let n = rows.len();
    if n == 0 {
        return;
    }
    let dims = rows[0].len();
    for d in 0..dims {
        let mean = rows.iter().map(|r| r[d]).sum::<f32>() / n as f32;
        let var = rows.iter().map(|r| (r[d] - mean) * (r[d] - mean)).sum::<f32>() / n as f32;
        let std = var.sqrt();
        for row in rows.iter_mut() {
            row[d] = if std > EPSILON {
                (row[d] - mean) / std
            } else {
                0.0
            };
        }
    }
}

/// Beat-synchronise, normalise and concatenate feature blocks
///
/// # Arguments
///
/// * `blocks` - Frame-level feature blocks (`[frame][dim]` each)
/// * `edges` - Sync frame edges from [`sync_edges`]
///
/// # Returns
///
/// Standardised stacked matrix (`[sync_frame][dim]`)
pub fn stack_features(blocks: &[&[Vec<f32>]], edges: &[usize]) -> Vec<Vec<f32>> {
    let n_sync = edges.len().saturating_sub(1);
    let mut stacked: Vec<Vec<f32>> = vec![Vec::new(); n_sync];

    for block in blocks {
        let mut synced = sync_mean(block, edges);
        normalize_rows(&mut synced);
        for (row, part) in stacked.iter_mut().zip(synced) {
            row.extend(part);
        }
    }

    standardize_columns(&mut stacked);
    log::debug!(
        "Stacked features: {} sync frames x {} dims",
        stacked.len(),
        stacked.first().map(|r| r.len()).unwrap_or(0)
    );
    stacked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_edges_dedup_and_clip() {
        let edges = sync_edges(&[0, 10, 10, 25, 40], 30);
        assert_eq!(edges, vec![0, 10, 25, 30]);
    }

    #[test]
    fn test_sync_mean() {
        let frames: Vec<Vec<f32>> = (0..6).map(|i| vec![i as f32]).collect();
        let synced = sync_mean(&frames, &[0, 2, 6]);
        assert_eq!(synced, vec![vec![0.5], vec![3.5]]);
    }

    #[test]
    fn test_standardize_columns() {
        let mut rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        standardize_columns(&mut rows);
        assert!((rows[0][0] + 1.0).abs() < 1e-6);
        assert!((rows[1][0] - 1.0).abs() < 1e-6);
        assert_eq!(rows[0][1], 0.0);
    }

    #[test]
    fn test_stack_concatenates_blocks() {
        let a: Vec<Vec<f32>> = (0..8).map(|i| vec![i as f32, 1.0]).collect();
        let b: Vec<Vec<f32>> = (0..8).map(|i| vec![(8 - i) as f32]).collect();
        let stacked = stack_features(&[&a, &b], &[0, 4, 8]);
        assert_eq!(stacked.len(), 2);
        assert_eq!(stacked[0].len(), 3);
    }
}
