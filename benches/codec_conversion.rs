//! Benchmarks for audio codec conversion throughput
//!
//! This benchmark measures:
//! - PCM byte decode/encode speed
//! - WAV container encode speed
//! - Sample-type conversion (int/float scaling)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tts_lib_rust::audio::codec;
use tts_lib_rust::{EncodedFormat, SampleType, Samples};

fn tone(len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| {
            let t = i as f32 / 24000.0;
            ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 16000.0) as i16
        })
        .collect()
}

fn bench_pcm_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("pcm_roundtrip");
    for seconds in [1usize, 10] {
        let samples = tone(seconds * 24000);
        let bytes = codec::encode_from_i16(&samples, 24000, EncodedFormat::Pcm).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("decode", seconds), &bytes, |b, bytes| {
            b.iter(|| codec::decode_to_i16(black_box(bytes), EncodedFormat::Pcm).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("encode", seconds), &samples, |b, samples| {
            b.iter(|| codec::encode_from_i16(black_box(samples), 24000, EncodedFormat::Pcm).unwrap())
        });
    }
    group.finish();
}

fn bench_wav_encode(c: &mut Criterion) {
    let samples = tone(24000);
    c.bench_function("wav_encode_1s", |b| {
        b.iter(|| codec::encode_from_i16(black_box(&samples), 24000, EncodedFormat::Wav).unwrap())
    });
}

fn bench_sample_conversion(c: &mut Criterion) {
    let samples = Samples::I16(tone(24000));
    let mut group = c.benchmark_group("sample_conversion");
    for target in [SampleType::I32, SampleType::F32] {
        group.bench_with_input(
            BenchmarkId::new("from_i16", target.as_str()),
            &target,
            |b, &target| b.iter(|| codec::convert_samples(black_box(&samples), target)),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_pcm_roundtrip,
    bench_wav_encode,
    bench_sample_conversion
);
criterion_main!(benches);
