use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slowscan_core::demodulator::FmDemodulator;

fn tone_chunk(freq_hz: f64, sample_rate: f64, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (std::f64::consts::TAU * freq_hz * i as f64 / sample_rate).sin() as f32)
        .collect()
}

fn benchmark_process_chunk(c: &mut Criterion) {
    let sample_rate = 48_000.0;
    let mut group = c.benchmark_group("demodulator_process");

    for chunk_len in [256usize, 1024, 4096, 8192].iter() {
        let chunk = tone_chunk(1900.0, sample_rate, *chunk_len);
        group.bench_with_input(BenchmarkId::from_parameter(chunk_len), chunk_len, |b, _| {
            let mut demod = FmDemodulator::new(sample_rate);
            b.iter(|| demod.process(black_box(&chunk)))
        });
    }

    group.finish();
}

fn benchmark_full_line_with_sync(c: &mut Criterion) {
    let sample_rate = 48_000.0;
    let mut audio = tone_chunk(1500.0, sample_rate, 2000);
    audio.extend(tone_chunk(1200.0, sample_rate, (0.009 * sample_rate) as usize));
    audio.extend(tone_chunk(1500.0, sample_rate, 2000));

    c.bench_function("demodulator_sync_pulse_detection", |b| {
        b.iter(|| {
            let mut demod = FmDemodulator::new(sample_rate);
            demod.process(black_box(&audio))
        })
    });
}

criterion_group!(benches, benchmark_process_chunk, benchmark_full_line_with_sync);
criterion_main!(benches);
