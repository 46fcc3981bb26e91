//! # Quantum-Chain Finality Archive Benchmarks
//!
//! | Path | Claim | Target |
//! |------|-------|--------|
//! | Envelope decode | Bounded by the length field | linear in payload |
//! | Archive call | Encode + one atomic batch | < 1ms for 16 KiB |
//! | Retrieve | Index lookup + verified decode | < 1ms for 16 KiB |
//! | Replay | Parallel re-verification | scales with cores |

use criterion::{criterion_group, criterion_main, Criterion};

fn bench_finality_archive(c: &mut Criterion) {
    qc_tests::benchmarks::qc_18_finality_archive::register_benchmarks(c);
}

criterion_group!(benches, bench_finality_archive);
criterion_main!(benches);
