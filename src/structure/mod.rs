//! Structural segmentation
//!
//! Turns the beat-synchronous feature matrix into labelled sections:
//!
//! 1. Cosine self-similarity matrix ([`similarity`])
//! 2. Multi-scale checkerboard novelty ([`novelty`])
//! 3. Adaptive-threshold peak picking with a minimum gap ([`boundaries`])
//! 4. Short-segment merging ([`merge`])
//! 5. Spectral clustering of segment embeddings into letters, then
//!    de-flickering of adjacent repeats ([`clustering`])
//! 6. Musical naming through a pluggable [`SectionLabeler`] ([`labeling`])
//!
//! When the front end is degraded (too few beats) the segmenter returns
//! equal-width fallback sections instead.

pub mod boundaries;
pub mod clustering;
pub mod labeling;
pub mod merge;
pub mod novelty;
pub mod similarity;

pub use labeling::{LetteredSegment, RepetitionLabeler, SectionLabeler};
pub use similarity::SelfSimilarityMatrix;

use crate::analysis::result::Section;
use crate::config::SegmentationConfig;
use crate::error::EngineError;
use crate::features::FeatureSet;

/// Label sequence cycled by fallback sections
const FALLBACK_LABELS: [&str; 4] = ["Intro", "Verse", "Chorus", "Bridge"];

/// Segmentation outcome
#[derive(Debug, Clone)]
pub struct SegmentationOutput {
    /// Sections sorted by start, covering `[0, duration]`
    pub sections: Vec<Section>,

    /// Number of clusters chosen (0 for fallback sections)
    pub n_clusters: usize,

    /// Fallback sections were used
    pub degraded: bool,
}

/// Equal-width sections cycling Intro, Verse, Chorus, Bridge
///
/// Returns no sections for a zero duration or count. Confidence is 0.
///
/// # Example
///
/// ```
/// use mixgrid_dsp::structure::fallback_sections;
///
/// let sections = fallback_sections(180.0, 4);
/// assert_eq!(sections.len(), 4);
/// assert_eq!(sections[2].label, "Chorus");
/// assert_eq!(sections[3].end, 180.0);
/// ```
pub fn fallback_sections(duration: f32, count: usize) -> Vec<Section> {
    if duration <= 0.0 || count == 0 {
        return vec![];
    }
    let width = duration / count as f32;
    (0..count)
        .map(|i| Section {
            label: FALLBACK_LABELS[i % FALLBACK_LABELS.len()].to_string(),
            start: i as f32 * width,
            end: if i + 1 == count {
                duration
            } else {
                (i + 1) as f32 * width
            },
            confidence: 0.0,
            cluster: None,
        })
        .collect()
}

/// Segment a track into labelled sections
///
/// # Arguments
///
/// * `features` - Front-end output
/// * `config` - Segmentation parameters
/// * `labeler` - Naming policy for clustered segments
///
/// # Returns
///
/// Sections covering `[0, features.duration]`. Degraded features yield
/// `config.fallback_sections` fallback sections.
///
/// # Errors
///
/// Returns `EngineError::ProcessingError` if the labeler returns the wrong
/// number of labels.
pub fn segment(
    features: &FeatureSet,
    config: &SegmentationConfig,
    labeler: &dyn SectionLabeler,
) -> Result<SegmentationOutput, EngineError> {
    let n = features.n_sync_frames();
    if features.degraded || n == 0 || features.sync_times.len() != n + 1 {
        log::warn!(
            "Structural analysis unavailable, using {} fallback sections",
            config.fallback_sections
        );
        return Ok(SegmentationOutput {
            sections: fallback_sections(features.duration, config.fallback_sections),
            n_clusters: 0,
            degraded: true,
        });
    }
    let times = &features.sync_times;

    // Step 1: Self-similarity
    let ssm = SelfSimilarityMatrix::from_features(&features.stacked);

    // Step 2: Novelty
    let novelty = novelty::multi_scale_novelty(&ssm, &config.kernel_sizes);

    // Step 3: Boundaries
    let params = boundaries::PeakPickParams {
        relative_threshold: config.relative_threshold,
        median_window: config.median_window,
        neighborhood: config.peak_neighborhood,
        min_gap_seconds: config.min_segment_seconds,
    };
    let edges = boundaries::pick_boundaries(&novelty, times, &params);

    // Step 4: Merge short segments
    let edges = merge::merge_short_segments(edges, times, &ssm, config.min_segment_seconds);

    // Step 5: Cluster
    let embeddings = clustering::segment_embeddings(&features.stacked, &edges);
    let cluster_params = clustering::ClusterParams {
        min_clusters: config.min_clusters,
        max_clusters: config.max_clusters,
        default_clusters: config.default_clusters,
        max_neighbors: config.max_neighbors,
    };
    let clusters = clustering::cluster_segments(&embeddings, &cluster_params);

    // Step 6: De-flicker adjacent repeats
    let mut spans: Vec<(usize, usize, usize)> = Vec::with_capacity(clusters.labels.len());
    for (i, &label) in clusters.labels.iter().enumerate() {
        match spans.last_mut() {
            Some(last) if last.2 == label => last.1 = edges[i + 1],
            _ => spans.push((edges[i], edges[i + 1], label)),
        }
    }

    let lettered: Vec<LetteredSegment> = spans
        .iter()
        .map(|&(lo, hi, label)| LetteredSegment {
            start: times[lo],
            end: times[hi],
            letter: clustering::letter_label(label),
        })
        .collect();

    // Step 7: Names
    let names = labeler.label(&lettered);
    if names.len() != lettered.len() {
        return Err(EngineError::ProcessingError(format!(
            "Labeler returned {} labels for {} segments",
            names.len(),
            lettered.len()
        )));
    }

    let edge_strength = |edge: usize| {
        if edge == 0 || edge >= n {
            1.0
        } else {
            novelty[edge]
        }
    };

    let sections: Vec<Section> = spans
        .iter()
        .zip(lettered)
        .zip(names)
        .map(|((&(lo, hi, _), seg), label)| Section {
            label,
            start: seg.start,
            end: seg.end,
            confidence: (0.5 + 0.25 * (edge_strength(lo) + edge_strength(hi))).clamp(0.0, 1.0),
            cluster: Some(seg.letter),
        })
        .collect();

    log::debug!(
        "Segmentation: {} sections, {} clusters (score {:.3})",
        sections.len(),
        clusters.k,
        clusters.score
    );

    Ok(SegmentationOutput {
        sections,
        n_clusters: clusters.k,
        degraded: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Six 15-frame blocks (A B C A B C), one sync frame per second
    fn block_feature_set() -> FeatureSet {
        let patterns = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut stacked = Vec::new();
        for block in 0..6 {
            for _ in 0..15 {
                stacked.push(patterns[block % 3].to_vec());
            }
        }
        let n = stacked.len();
        FeatureSet {
            duration: n as f32,
            frame_rate: 43.0,
            tempo: None,
            beat_frames: vec![],
            beat_times: vec![],
            chroma: vec![],
            sync_times: (0..=n).map(|i| i as f32).collect(),
            stacked,
            degraded: false,
        }
    }

    fn test_config() -> SegmentationConfig {
        SegmentationConfig {
            kernel_sizes: vec![4, 8],
            ..SegmentationConfig::default()
        }
    }

    #[test]
    fn test_fallback_sections_cover_duration() {
        let sections = fallback_sections(180.0, 4);
        let labels: Vec<&str> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Intro", "Verse", "Chorus", "Bridge"]);
        assert_eq!(sections[0].start, 0.0);
        assert_eq!(sections[3].end, 180.0);
        for w in sections.windows(2) {
            assert_eq!(w[0].end, w[1].start);
            assert!((w[0].end - w[0].start - 45.0).abs() < 1e-4);
        }
        assert!(sections.iter().all(|s| s.confidence == 0.0));
    }

    #[test]
    fn test_fallback_sections_empty_cases() {
        assert!(fallback_sections(0.0, 4).is_empty());
        assert!(fallback_sections(10.0, 0).is_empty());
        assert_eq!(fallback_sections(10.0, 6)[4].label, "Intro");
    }

    #[test]
    fn test_degraded_features_use_fallback() {
        let mut features = block_feature_set();
        features.degraded = true;
        let out = segment(&features, &test_config(), &RepetitionLabeler::default()).unwrap();
        assert!(out.degraded);
        assert_eq!(out.sections.len(), 4);
        assert_eq!(out.n_clusters, 0);
    }

    #[test]
    fn test_block_structure_is_recovered() {
        let features = block_feature_set();
        let out = segment(&features, &test_config(), &RepetitionLabeler::default()).unwrap();
        assert!(!out.degraded);

        let starts: Vec<f32> = out.sections.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0.0, 15.0, 30.0, 45.0, 60.0, 75.0]);
        assert_eq!(out.sections.last().unwrap().end, 90.0);

        let letters: Vec<&str> = out
            .sections
            .iter()
            .map(|s| s.cluster.as_deref().unwrap())
            .collect();
        assert_eq!(letters, vec!["A", "B", "C", "A", "B", "C"]);

        assert_eq!(out.sections[0].label, "Intro");
        assert_eq!(out.sections[3].label, "Chorus");
        assert_eq!(out.sections[5].label, "Outro");
        assert!(out
            .sections
            .iter()
            .all(|s| (0.5..=1.0).contains(&s.confidence)));
    }

    struct Silent;

    impl SectionLabeler for Silent {
        fn label(&self, _segments: &[LetteredSegment]) -> Vec<String> {
            vec![]
        }
    }

    #[test]
    fn test_labeler_length_mismatch_is_error() {
        let features = block_feature_set();
        assert!(segment(&features, &test_config(), &Silent).is_err());
    }
}
