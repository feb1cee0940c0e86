//! Example: Analyze a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- <file> [--json]

use mixgrid_dsp::{analyze_file, AnalysisConfig};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let path = match args.iter().find(|a| !a.starts_with("--")) {
        Some(p) => p.clone(),
        None => {
            eprintln!("Usage: analyze_file <file> [--json]");
            std::process::exit(2);
        }
    };

    let result = analyze_file(&path, &AnalysisConfig::default())?;

    if json {
        println!("{}", result.to_json()?);
        return Ok(());
    }

    println!("Analysis Results:");
    println!("  BPM: {:.2} (clarity: {:.2})", result.bpm, result.metadata.tempo_clarity);
    println!("  Key: {} (confidence: {:.2})", result.key, result.key_confidence);
    println!("  Duration: {:.2}s, {} beats", result.duration, result.beats.len());
    println!("  Processing time: {:.2} ms", result.metadata.processing_time_ms);
    if !result.metadata.flags.is_empty() {
        println!("  Flags: {:?}", result.metadata.flags);
    }
    println!("Sections:");
    for section in &result.sections {
        println!(
            "  {:>8.2}s - {:>8.2}s  {:<10} {} (confidence: {:.2})",
            section.start,
            section.end,
            section.label,
            section.cluster.as_deref().unwrap_or("-"),
            section.confidence
        );
    }

    Ok(())
}
