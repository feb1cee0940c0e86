//! Example: Analyze multiple audio files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files. Each file analysis is single-threaded.
//! - Results are cached by content hash; a duplicate whose analysis already finished is reused.

use mixgrid_dsp::identity::file_content_hash;
use mixgrid_dsp::{analyze_file, AnalysisConfig, AnalysisResult, EngineError, MemoryStore, Store};
use rayon::prelude::*;
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Default admission limit for simultaneous analyses
const DEFAULT_JOBS: usize = 3;

/// Per-file outcome, one JSON line in `--json` mode
#[derive(serde::Serialize)]
struct ItemOut {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Look up by content hash; analyse outside the lock on a miss
fn analyze_one(
    path: &str,
    store: &Mutex<MemoryStore<AnalysisResult>>,
    config: &AnalysisConfig,
) -> Result<(String, Arc<AnalysisResult>), EngineError> {
    let poisoned = || EngineError::ProcessingError("cache lock poisoned".to_string());

    let id = file_content_hash(path)?;
    if let Some(hit) = store.lock().map_err(|_| poisoned())?.get(&id) {
        return Ok((id, hit));
    }
    let result = analyze_file(path, config)?;
    let stored = store.lock().map_err(|_| poisoned())?.put(id.clone(), result);
    Ok((id, stored))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] <file1> <file2> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: 3)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or(DEFAULT_JOBS);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let config = AnalysisConfig::default();
    let store: Mutex<MemoryStore<AnalysisResult>> = Mutex::new(MemoryStore::new());
    let t0 = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let outcome = analyze_one(path, &store, &config);
                match outcome {
                    Ok((id, result)) => ItemOut {
                        file: path.clone(),
                        id: Some(id),
                        result: Some((*result).clone()),
                        error: None,
                    },
                    Err(e) => ItemOut {
                        file: path.clone(),
                        id: None,
                        result: None,
                        error: Some(format!("analysis failed: {e}")),
                    },
                }
            })
            .collect()
    });

    for (idx, o) in outs.iter().enumerate() {
        if json {
            println!("{}", serde_json::to_string(o)?);
            continue;
        }
        match (&o.result, &o.error) {
            (Some(r), _) => println!(
                "[{}/{}] {}: BPM={:.2} Key={} sections={} time={:.2}ms",
                idx + 1,
                outs.len(),
                o.file,
                r.bpm,
                r.key,
                r.sections.len(),
                r.metadata.processing_time_ms
            ),
            (None, err) => println!(
                "[{}/{}] {}: ERROR: {}",
                idx + 1,
                outs.len(),
                o.file,
                err.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    eprintln!("Batch done in {:.2}s", t0.elapsed().as_secs_f32());
    Ok(())
}
