//! # Arena Performance Benchmark
//!
//! The arena sits on the streaming hot path, so allocate and release must
//! stay O(class count) and tick must stay O(quarantine length).
//!
//! Run with: `cargo bench --package styx_arena`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use styx_arena::BlockArena;

/// A cycle's worth of streaming traffic per iteration.
const BLOCKS_PER_CYCLE: u32 = 64;

/// Benchmark: construct a production-sized arena.
fn bench_arena_creation(c: &mut Criterion) {
    c.bench_function("arena_creation_64MiB", |b| {
        b.iter(|| black_box(BlockArena::new(64 * 1024 * 1024, 4096, 256)));
    });
}

/// Benchmark: one full streaming cycle - allocate a frame's blocks,
/// release them all, then age the quarantine.
fn bench_streaming_cycle(c: &mut Criterion) {
    c.bench_function("streaming_cycle_64_blocks", |b| {
        let mut arena = BlockArena::new(64 * 1024 * 1024, 4096, 256);
        let mut handles = Vec::with_capacity(BLOCKS_PER_CYCLE as usize);
        b.iter(|| {
            for i in 0..BLOCKS_PER_CYCLE {
                let size = 1024 + i * 512;
                if let Ok(handle) = arena.allocate(size) {
                    handles.push(handle);
                }
            }
            for handle in handles.drain(..) {
                arena.release(handle);
            }
            arena.tick();
            black_box(&arena);
        });
    });
}

/// Benchmark: bucket search when the exact class is empty and the
/// allocation has to walk up to a larger class.
fn bench_larger_class_fallback(c: &mut Criterion) {
    c.bench_function("allocate_larger_class_fallback", |b| {
        let mut arena = BlockArena::new(64 * 1024 * 1024, 4096, 256);
        b.iter(|| {
            // Single free block lives in the top class; every small
            // request walks the empty classes below it.
            let handle = arena.allocate(black_box(300)).expect("space available");
            arena.release(handle);
            arena.tick();
            arena.tick();
        });
    });
}

criterion_group!(
    benches,
    bench_arena_creation,
    bench_streaming_cycle,
    bench_larger_class_fallback
);
criterion_main!(benches);
