//! Example: Analyze a track and render a short remix on the bar grid
//!
//! Every detected section contributes its first bars, placed back to back;
//! the last one is shifted up two semitones and looped.
//!
//! Usage:
//!   cargo run --release --example render_mix -- <file> [out.wav] [--bpm N]

use mixgrid_dsp::{
    analyze_audio, decode_audio, render_arrangement, AnalysisConfig, ArrangementItem, MemoryStore,
    RenderConfig, Store, StretchConfig, TimeStretcher,
};
use std::env;

/// Bars taken from each section
const BARS_PER_SECTION: u32 = 4;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut project_bpm: Option<f64> = None;
    if let Some(pos) = args.iter().position(|a| a == "--bpm") {
        let v = args.get(pos + 1).ok_or("--bpm requires a value")?.parse::<f64>()?;
        project_bpm = Some(v);
        args.drain(pos..pos + 2);
    }
    let input = match args.first() {
        Some(p) => p.clone(),
        None => {
            eprintln!("Usage: render_mix <file> [out.wav] [--bpm N]");
            std::process::exit(2);
        }
    };
    let output = args.get(1).cloned().unwrap_or_else(|| "mix.wav".to_string());

    let source = decode_audio(&input)?;
    let analysis = analyze_audio(&source, &AnalysisConfig::default())?;
    let source_bpm = analysis.bpm as f64;
    let project_bpm = project_bpm.unwrap_or(source_bpm);
    println!(
        "Source: {:.2} BPM, key {}, {} sections",
        source_bpm,
        analysis.key,
        analysis.sections.len()
    );

    let mut sources: MemoryStore<mixgrid_dsp::AudioBuffer> = MemoryStore::new();
    sources.put("source".to_string(), source);

    let bar_seconds = 60.0 / source_bpm * 4.0;
    let last = analysis.sections.len().saturating_sub(1);
    let items: Vec<ArrangementItem> = analysis
        .sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let start = section.start as f64;
            let end = (start + bar_seconds * BARS_PER_SECTION as f64).min(section.end as f64);
            ArrangementItem {
                source_ref: "source".to_string(),
                slice_start: start,
                slice_end: end,
                source_bpm,
                semitone_shift: if i == last { 2.0 } else { 0.0 },
                at_bar: i as u32 * BARS_PER_SECTION,
                loop_count: if i == last { 2 } else { 1 },
            }
        })
        .collect();

    let stretcher = TimeStretcher::new(&StretchConfig::default())?;
    let config = RenderConfig {
        master_fade_out_ms: 2000,
        ..RenderConfig::default()
    };
    let rendered = render_arrangement(project_bpm, &items, &sources, &stretcher, &config)?;

    for warning in &rendered.warnings {
        eprintln!("warning: {}", warning);
    }
    rendered.mix.write_wav(&output)?;
    println!(
        "Wrote {} ({:.2}s at {:.2} BPM{})",
        output,
        rendered.mix.duration_seconds(),
        project_bpm,
        if rendered.degraded { ", fallback stretch" } else { "" }
    );

    Ok(())
}
