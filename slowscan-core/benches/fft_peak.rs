use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slowscan_core::dsp::FftPeakFinder;

fn tone(freq_hz: f64, sample_rate: f64, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (std::f64::consts::TAU * freq_hz * i as f64 / sample_rate).sin() as f32)
        .collect()
}

fn benchmark_estimate_frequency(c: &mut Criterion) {
    let sample_rate = 48_000.0;
    let mut group = c.benchmark_group("estimate_frequency");

    for window_len in [64usize, 128, 256, 512, 1024].iter() {
        let samples = tone(1900.0, sample_rate, *window_len);
        group.bench_with_input(BenchmarkId::from_parameter(window_len), window_len, |b, _| {
            let mut finder = FftPeakFinder::new(sample_rate, 4096);
            b.iter(|| finder.estimate_frequency(black_box(&samples)))
        });
    }

    group.finish();
}

fn benchmark_estimate_pixel(c: &mut Criterion) {
    let sample_rate = 48_000.0;
    let samples = tone(2100.0, sample_rate, 128);

    c.bench_function("estimate_pixel_single_window", |b| {
        let mut finder = FftPeakFinder::new(sample_rate, 4096);
        b.iter(|| finder.estimate_pixel(black_box(&samples)))
    });
}

criterion_group!(benches, benchmark_estimate_frequency, benchmark_estimate_pixel);
criterion_main!(benches);
