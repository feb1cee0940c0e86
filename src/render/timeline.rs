//! Bar-grid timeline rendering
//!
//! # Algorithm
//!
//! 1. Validate all items and resolve their sources (fail fast)
//! 2. Per item: slice, stretch to the project tempo (ratio
//!    `project_bpm / source_bpm`) with the item's pitch shift, convert to the
//!    output channel layout and rate, then repeat `loop_count` times
//! 3. Nominal offset = `at_bar × bar_seconds × sample_rate`, with
//!    `bar_seconds = 60 / bpm × beats_per_bar`
//! 4. Placement against earlier material (arrival order):
//!    - offset at, or within one crossfade after, the end of earlier
//!      material: pulled back so the crossfade overlaps that tail
//!    - offset inside earlier material: crossfades in place
//!    - otherwise: placed on the grid, fading in over whatever is there
//! 5. Output length = furthest item end, extended to `min_bars`
//! 6. Mix: linear crossfade over the applied window (existing content fades
//!    out as the item fades in), additive sum after it
//! 7. Optional master fade-out, then peak normalisation to the ceiling

use super::arrangement::{resolve_sources, ArrangementItem};
use super::stretch::{tempo_ratio, TimeStretcher};
use crate::config::RenderConfig;
use crate::error::EngineError;
use crate::io::wav::{f32_to_i16, write_wav_pcm16};
use crate::io::AudioBuffer;
use crate::preprocessing::normalization::{apply_peak_ceiling, fade_out_tail, linear_ramp};
use crate::store::Store;

/// Rendered mix
#[derive(Debug, Clone)]
pub struct Mix {
    buffer: AudioBuffer,
}

impl Mix {
    /// Interleaved output buffer
    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    /// Consume the mix, returning its buffer
    pub fn into_buffer(self) -> AudioBuffer {
        self.buffer
    }

    /// Length in sample frames
    pub fn duration_samples(&self) -> usize {
        self.buffer.frames()
    }

    /// Length in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.buffer.duration_seconds()
    }

    /// Interleaved 16-bit PCM samples
    pub fn to_pcm16(&self) -> Vec<i16> {
        self.buffer.samples().iter().map(|&s| f32_to_i16(s)).collect()
    }

    /// Write the mix as a 16-bit PCM WAV file
    pub fn write_wav<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), EngineError> {
        write_wav_pcm16(path, &self.buffer)
    }
}

/// Where an item ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Item index in the request
    pub index: usize,
    /// Grid offset before crossfade adjustment, in frames
    pub nominal_start: usize,
    /// Actual start, in frames
    pub start: usize,
    /// Item length including loops, in frames
    pub length: usize,
    /// Crossfade applied at the item's leading edge, in frames
    pub crossfade: usize,
}

impl Placement {
    /// First frame after the item
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Render result
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The finished mix
    pub mix: Mix,
    /// At least one item used the fallback stretch
    pub degraded: bool,
    /// Warnings collected while rendering
    pub warnings: Vec<String>,
    /// Placement of every item, in request order
    pub placements: Vec<Placement>,
}

/// Compute item placements against earlier material
///
/// `offsets[i]` and `lengths[i]` are the nominal grid offset and the full
/// (looped) length of item `i`, in frames.
pub fn place_items(offsets: &[usize], lengths: &[usize], crossfade: usize) -> Vec<Placement> {
    let mut placed: Vec<Placement> = Vec::with_capacity(offsets.len());
    for (index, (&nominal, &length)) in offsets.iter().zip(lengths.iter()).enumerate() {
        // Earlier material starting at or before this item, furthest end wins
        let predecessor = placed
            .iter()
            .filter(|p| p.start <= nominal)
            .max_by_key(|p| p.end())
            .copied();

        let placement = match predecessor {
            Some(prev) if nominal >= prev.end() && nominal - prev.end() <= crossfade => {
                let applied = crossfade.min(length).min(prev.length);
                Placement {
                    index,
                    nominal_start: nominal,
                    start: prev.end() - applied,
                    length,
                    crossfade: applied,
                }
            }
            Some(prev) if nominal < prev.end() => Placement {
                index,
                nominal_start: nominal,
                start: nominal,
                length,
                crossfade: crossfade.min(length).min(prev.length),
            },
            _ => Placement {
                index,
                nominal_start: nominal,
                start: nominal,
                length,
                crossfade: crossfade.min(length),
            },
        };
        placed.push(placement);
    }
    placed
}

/// Render an arrangement onto the bar grid
///
/// # Arguments
///
/// * `project_bpm` - Grid tempo
/// * `items` - Items in arrival order
/// * `sources` - Store resolving `source_ref`s to audio
/// * `stretcher` - Tempo/pitch transformer
/// * `config` - Output format, crossfade, fade-out, ceiling
///
/// # Errors
///
/// - `EngineError::InvalidInput` for a bad BPM or output format
/// - `EngineError::InvalidArrangementItem` for any invalid item, before any
///   audio is processed
/// - `EngineError::ProcessorUnavailable` if stretching needs the external
///   processor and fallback is disabled
/// - `EngineError::NumericalError` if the mix contains non-finite samples
pub fn render_arrangement(
    project_bpm: f64,
    items: &[ArrangementItem],
    sources: &dyn Store<AudioBuffer>,
    stretcher: &TimeStretcher,
    config: &RenderConfig,
) -> Result<RenderOutput, EngineError> {
    if !project_bpm.is_finite() || project_bpm <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "Project BPM must be positive and finite, got {}",
            project_bpm
        )));
    }
    if config.target_sample_rate == 0 || !(1..=2).contains(&config.channels) || config.beats_per_bar == 0 {
        return Err(EngineError::InvalidInput(format!(
            "Invalid render format: {} Hz, {} channels, {} beats per bar",
            config.target_sample_rate, config.channels, config.beats_per_bar
        )));
    }

    // Step 1: Fail fast on bad items
    let resolved = resolve_sources(items, sources)?;

    let rate = config.target_sample_rate;
    let channels = config.channels as usize;
    let bar_seconds = 60.0 / project_bpm * config.beats_per_bar as f64;
    let crossfade = (config.crossfade_ms as f64 / 1000.0 * rate as f64).round() as usize;
    log::debug!(
        "Rendering {} items at {:.2} BPM (bar {:.3}s, crossfade {} frames)",
        items.len(),
        project_bpm,
        bar_seconds,
        crossfade
    );

    // Step 2: Transform every item
    let mut degraded = false;
    let mut warnings = Vec::new();
    let mut rendered: Vec<Vec<f32>> = Vec::with_capacity(items.len());
    for (index, (item, source)) in items.iter().zip(resolved.iter()).enumerate() {
        let slice = source.slice_seconds(item.slice_start, item.slice_end)?;
        let (ratio, ratio_warning) = tempo_ratio(project_bpm, item.source_bpm)?;
        if let Some(w) = ratio_warning {
            warnings.push(format!("item {}: {}", index, w));
        }

        let outcome = stretcher.stretch(&slice, ratio, item.semitone_shift)?;
        degraded |= outcome.degraded;
        warnings.extend(outcome.warnings.into_iter().map(|w| format!("item {}: {}", index, w)));

        let laid_out = if channels == 2 {
            outcome.buffer.to_stereo()
        } else {
            AudioBuffer::from_mono(outcome.buffer.to_mono(), outcome.buffer.sample_rate())?
        };
        let looped = laid_out.resample(rate)?.repeat(item.loop_count as usize);
        log::debug!(
            "Item {}: ratio {:.4}, {:+.2} st, {} frames x{}",
            index,
            ratio,
            item.semitone_shift,
            looped.frames() / item.loop_count.max(1) as usize,
            item.loop_count
        );
        rendered.push(looped.into_samples());
    }

    // Steps 3-4: Placement
    let offsets: Vec<usize> = items
        .iter()
        .map(|item| (item.at_bar as f64 * bar_seconds * rate as f64).round() as usize)
        .collect();
    let lengths: Vec<usize> = rendered.iter().map(|s| s.len() / channels).collect();
    let placements = place_items(&offsets, &lengths, crossfade);

    // Step 5: Output length
    let min_frames = config
        .min_bars
        .map(|bars| (bars as f64 * bar_seconds * rate as f64).round() as usize)
        .unwrap_or(0);
    let total_frames = placements
        .iter()
        .map(Placement::end)
        .max()
        .unwrap_or(0)
        .max(min_frames);
    let mut output = vec![0.0f32; total_frames * channels];

    // Step 6: Mix
    for (placement, samples) in placements.iter().zip(rendered.iter()) {
        let ramp = linear_ramp(placement.crossfade);
        for frame in 0..placement.length {
            let out_frame = placement.start + frame;
            for ch in 0..channels {
                let incoming = samples[frame * channels + ch];
                let slot = &mut output[out_frame * channels + ch];
                *slot = match ramp.get(frame) {
                    Some(&w) => *slot * (1.0 - w) + incoming * w,
                    None => *slot + incoming,
                };
            }
        }
    }

    // Step 7: Master fade and ceiling
    let fade_frames = (config.master_fade_out_ms as f64 / 1000.0 * rate as f64).round() as usize;
    fade_out_tail(&mut output, channels, fade_frames);
    apply_peak_ceiling(&mut output, config.peak_ceiling);

    if output.iter().any(|s| !s.is_finite()) {
        return Err(EngineError::NumericalError(
            "Mix contains non-finite samples".to_string(),
        ));
    }

    let buffer = AudioBuffer::new(output, rate, config.channels)?;
    log::debug!(
        "Rendered {} frames ({:.2}s), degraded = {}",
        buffer.frames(),
        buffer.duration_seconds(),
        degraded
    );

    Ok(RenderOutput {
        mix: Mix { buffer },
        degraded,
        warnings,
        placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_item_fades_in_on_grid() {
        let p = place_items(&[1000], &[500], 100);
        assert_eq!(p[0].start, 1000);
        assert_eq!(p[0].crossfade, 100);

        let short = place_items(&[0], &[40], 100);
        assert_eq!(short[0].crossfade, 40);
    }

    #[test]
    fn test_adjacent_item_is_pulled_back() {
        let p = place_items(&[0, 1000], &[1000, 1000], 100);
        assert_eq!(p[1].start, 900);
        assert_eq!(p[1].crossfade, 100);
    }

    #[test]
    fn test_small_gap_is_closed() {
        let p = place_items(&[0, 1050], &[1000, 1000], 100);
        assert_eq!(p[1].start, 900);
    }

    #[test]
    fn test_large_gap_keeps_grid() {
        let p = place_items(&[0, 1200], &[1000, 1000], 100);
        assert_eq!(p[1].start, 1200);
        assert_eq!(p[1].crossfade, 100);
    }

    #[test]
    fn test_overlapping_item_crossfades_in_place() {
        let p = place_items(&[0, 500], &[1000, 1000], 100);
        assert_eq!(p[1].start, 500);
        assert_eq!(p[1].crossfade, 100);
    }

    #[test]
    fn test_crossfade_bounded_by_item_lengths() {
        let p = place_items(&[0, 1000, 1030], &[1000, 30, 1000], 100);
        assert_eq!(p[1].crossfade, 30);
        assert_eq!(p[1].start, 970);
        // Third item follows the 30-frame item, which bounds its crossfade
        assert!(p[2].crossfade <= 30);
        for placement in &p {
            assert!(placement.crossfade <= 100.min(placement.length));
        }
    }

    #[test]
    fn test_pcm16_conversion() {
        let buffer = AudioBuffer::new(vec![0.0, 1.0, -1.0, 0.5], 44100, 2).unwrap();
        let mix = Mix { buffer };
        assert_eq!(mix.to_pcm16(), vec![0, i16::MAX, -i16::MAX, 16384]);
        assert_eq!(mix.duration_samples(), 2);
    }
}
