//! Performance benchmarks for analysis and rendering

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mixgrid_dsp::{
    analyze_audio, render_arrangement, AnalysisConfig, ArrangementItem, AudioBuffer, MemoryStore,
    RenderConfig, Store, StretchConfig, TimeStretcher,
};

fn sine(seconds: usize, sample_rate: u32) -> Vec<f32> {
    (0..sample_rate as usize * seconds)
        .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / sample_rate as f32).sin() * 0.5)
        .collect()
}

fn bench_analyze_audio(c: &mut Criterion) {
    // Generate synthetic audio (30 seconds at 44.1kHz)
    let buffer = AudioBuffer::from_mono(sine(30, 44100), 44100).unwrap();
    let config = AnalysisConfig::default();

    c.bench_function("analyze_audio_30s", |b| {
        b.iter(|| {
            let _ = analyze_audio(black_box(&buffer), black_box(&config));
        });
    });
}

fn bench_render(c: &mut Criterion) {
    let mut store: MemoryStore<AudioBuffer> = MemoryStore::new();
    store.put(
        "sine".to_string(),
        AudioBuffer::from_mono(sine(10, 44100), 44100).unwrap(),
    );
    let items: Vec<ArrangementItem> = (0..8)
        .map(|bar| ArrangementItem {
            source_ref: "sine".to_string(),
            slice_start: 0.0,
            slice_end: 2.0,
            source_bpm: 120.0,
            semitone_shift: 0.0,
            at_bar: bar,
            loop_count: 1,
        })
        .collect();
    let stretcher = TimeStretcher::new(&StretchConfig::default()).unwrap();
    let config = RenderConfig::default();

    c.bench_function("render_8_bars", |b| {
        b.iter(|| {
            let _ = render_arrangement(
                black_box(120.0),
                black_box(&items),
                &store,
                &stretcher,
                &config,
            );
        });
    });
}

criterion_group!(benches, bench_analyze_audio, bench_render);
criterion_main!(benches);
