//! Short-segment merging
//!
//! Each pass merges the shortest segment below the minimum length (earliest
//! on ties) into one neighbour and removes exactly one edge, so the loop
//! ends after at most `segments − 1` passes. Edge segments have one
//! neighbour and merge into it unconditionally; interior segments join the
//! neighbour with the higher mean similarity across the shared boundary.

use super::similarity::SelfSimilarityMatrix;

/// Frames on each side of a boundary used to measure cross-boundary similarity
const BOUNDARY_CONTEXT_FRAMES: usize = 8;

/// Mean `S[x][y]` for `x` in `left` and `y` in `right`
fn block_mean(ssm: &SelfSimilarityMatrix, left: std::ops::Range<usize>, right: std::ops::Range<usize>) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for x in left {
        for y in right.clone() {
            sum += ssm.get(x, y);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Similarity between the frames just before and just after `edge`, each
/// side limited to its own segment
fn cross_boundary_similarity(
    ssm: &SelfSimilarityMatrix,
    left_start: usize,
    edge: usize,
    right_end: usize,
) -> f32 {
    let w_left = BOUNDARY_CONTEXT_FRAMES.min(edge - left_start);
    let w_right = BOUNDARY_CONTEXT_FRAMES.min(right_end - edge);
    block_mean(ssm, edge - w_left..edge, edge..edge + w_right)
}

/// Merge segments shorter than `min_seconds`
///
/// # Arguments
///
/// * `edges` - Segment edges in sync frames (`0, ..., N`)
/// * `times` - Time of every edge index in seconds (`N + 1` entries)
/// * `ssm` - Self-similarity matrix over the `N` sync frames
/// * `min_seconds` - Minimum segment duration
///
/// # Returns
///
/// Edges after merging; never fewer than two (one segment)
pub fn merge_short_segments(
    mut edges: Vec<usize>,
    times: &[f32],
    ssm: &SelfSimilarityMatrix,
    min_seconds: f32,
) -> Vec<usize> {
    let mut merges = 0usize;

    while edges.len() > 2 {
        let n_segments = edges.len() - 1;

        // Shortest violating segment, earliest on ties
        let mut target: Option<(usize, f32)> = None;
        for i in 0..n_segments {
            let length = times[edges[i + 1]] - times[edges[i]];
            if length < min_seconds && target.map_or(true, |(_, l)| length < l) {
                target = Some((i, length));
            }
        }
        let Some((i, _)) = target else {
            break;
        };

        let remove = if i == 0 {
            1
        } else if i == n_segments - 1 {
            i
        } else {
            let left_sim = cross_boundary_similarity(ssm, edges[i - 1], edges[i], edges[i + 1]);
            let right_sim = cross_boundary_similarity(ssm, edges[i], edges[i + 1], edges[i + 2]);
            if right_sim > left_sim {
                i + 1
            } else {
                i
            }
        };

        edges.remove(remove);
        merges += 1;
    }

    log::debug!(
        "Merged {} short segments, {} remain",
        merges,
        edges.len() - 1
    );
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_features(blocks: &[(usize, [f32; 2])]) -> Vec<Vec<f32>> {
        blocks
            .iter()
            .flat_map(|(len, v)| std::iter::repeat(v.to_vec()).take(*len))
            .collect()
    }

    #[test]
    fn test_no_merge_when_all_long() {
        let ssm = SelfSimilarityMatrix::from_features(&vec![vec![1.0, 0.0]; 30]);
        let times: Vec<f32> = (0..=30).map(|i| i as f32).collect();
        let edges = merge_short_segments(vec![0, 10, 20, 30], &times, &ssm, 5.0);
        assert_eq!(edges, vec![0, 10, 20, 30]);
    }

    #[test]
    fn test_edge_segment_merges_into_only_neighbour() {
        let ssm = SelfSimilarityMatrix::from_features(&vec![vec![1.0, 0.0]; 30]);
        let times: Vec<f32> = (0..=30).map(|i| i as f32).collect();
        assert_eq!(
            merge_short_segments(vec![0, 2, 30], &times, &ssm, 5.0),
            vec![0, 30]
        );
        assert_eq!(
            merge_short_segments(vec![0, 28, 30], &times, &ssm, 5.0),
            vec![0, 30]
        );
    }

    #[test]
    fn test_interior_segment_joins_more_similar_side() {
        // Short middle block looks like the right block
        let features = block_features(&[(10, [1.0, 0.0]), (3, [0.0, 1.0]), (10, [0.0, 1.0])]);
        let ssm = SelfSimilarityMatrix::from_features(&features);
        let times: Vec<f32> = (0..=23).map(|i| i as f32).collect();
        let edges = merge_short_segments(vec![0, 10, 13, 23], &times, &ssm, 5.0);
        assert_eq!(edges, vec![0, 10, 23]);
    }

    #[test]
    fn test_merge_count_is_bounded() {
        let ssm = SelfSimilarityMatrix::from_features(&vec![vec![1.0]; 10]);
        let times: Vec<f32> = (0..=10).map(|i| i as f32).collect();
        let edges: Vec<usize> = (0..=10).collect();
        // Ten 1-second segments, minimum 100 s: everything collapses to one
        assert_eq!(merge_short_segments(edges, &times, &ssm, 100.0), vec![0, 10]);
    }
}
