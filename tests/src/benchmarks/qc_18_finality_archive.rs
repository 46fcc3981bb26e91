//! # QC-18 Finality Archive Benchmarks
//!
//! Hot paths measured:
//! - Envelope encode/decode per payload size, compressed and identity
//! - Full archive call (encode + atomic batch + index) on the in-memory store
//! - Verified retrieval
//! - Parallel checkpoint replay

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use qc_18_finality_archive::test_utils::make_segment_payload;
use qc_18_finality_archive::{
    ArchiveConfig, CompressionParams, EnvelopeCodec, FinalityArchiveApi, FinalityArchiveService,
};
use std::time::Duration;

const PAYLOAD_SIZES: [usize; 4] = [1024, 16 * 1024, 256 * 1024, 1024 * 1024];

pub fn bench_envelope_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18/envelope");
    group.measurement_time(Duration::from_secs(10));

    let codec = EnvelopeCodec::default();
    let modes = [
        ("zstd_l3", CompressionParams::new(3)),
        ("identity", CompressionParams::disabled()),
    ];

    for size in PAYLOAD_SIZES {
        let payload = make_segment_payload(size as u64, size);
        group.throughput(Throughput::Bytes(size as u64));

        for (name, params) in modes {
            group.bench_with_input(
                BenchmarkId::new(format!("encode_{}", name), size),
                &payload,
                |b, p| b.iter(|| black_box(codec.encode(p, &params))),
            );

            let Ok(envelope) = codec.encode(&payload, &params) else {
                continue;
            };
            group.bench_with_input(
                BenchmarkId::new(format!("decode_{}", name), size),
                &envelope,
                |b, e| b.iter(|| black_box(codec.decode(e, &params))),
            );
        }
    }

    group.finish();
}

pub fn bench_archive_and_retrieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18/service");
    group.measurement_time(Duration::from_secs(10));

    let params = CompressionParams::default();
    let payload = make_segment_payload(0, 16 * 1024);
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("archive_16k", |b| {
        let Ok(service) = FinalityArchiveService::in_memory(ArchiveConfig::default()) else {
            return;
        };
        let mut id = 0u64;
        b.iter(|| {
            id += 1;
            black_box(service.archive_segment(id, &payload, &params))
        })
    });

    if let Ok(service) = FinalityArchiveService::in_memory(ArchiveConfig::default()) {
        for id in 1..=1024u64 {
            let _ = service.archive_segment(id, &payload, &params);
        }
        let mut id = 0u64;
        group.bench_function("retrieve_16k", |b| {
            b.iter(|| {
                id = id % 1024 + 1;
                black_box(service.retrieve_segment(id))
            })
        });
    }

    group.finish();
}

pub fn bench_checkpoint_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18/checkpoint");
    group.measurement_time(Duration::from_secs(10));

    for segments in [64u64, 256, 1024] {
        let config = ArchiveConfig::default().with_checkpoint_interval(segments);
        let Ok(service) = FinalityArchiveService::in_memory(config) else {
            continue;
        };
        for id in 1..=segments {
            let _ = service.archive_segment(
                id,
                &make_segment_payload(id, 4096),
                &CompressionParams::default(),
            );
        }
        let Some(manifest) = service.latest_checkpoint() else {
            continue;
        };

        group.throughput(Throughput::Elements(segments));
        group.bench_with_input(
            BenchmarkId::new("replay_4k_segments", segments),
            &manifest.id,
            |b, id| b.iter(|| black_box(service.replay_checkpoint(*id))),
        );
    }

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_envelope_codec(c);
    bench_archive_and_retrieve(c);
    bench_checkpoint_replay(c);
}
