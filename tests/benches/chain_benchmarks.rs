//! # Hybrid-Chain Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Block index | integrity scan over a linear chain |
//! | Chain selection | import of a fresh best block |
//! | Rules | batch header validation |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hc_block_index::BlockIndexApi;
use hc_consensus::adapters::InMemoryExecutor;
use hc_consensus::ChainSelectorApi;
use hc_tests::fixtures::{genesis, mining_child, unity_config, Node};
use shared_types::{Block, BlockHeader};
use std::time::Duration;

fn linear_chain(len: u64) -> Vec<BlockHeader> {
    let mut chain = Vec::with_capacity(len as usize);
    let mut tip = genesis();
    for n in 0..len {
        let next = mining_child(&tip, 16, (n % 251) as u8);
        chain.push(next.clone());
        tip = next;
    }
    chain
}

fn seeded_node(chain: &[BlockHeader]) -> Node {
    let node = Node::new(unity_config(u64::MAX / 2), InMemoryExecutor::new());
    for header in chain {
        let _ = node
            .selector
            .try_connect(&Block::new(header.clone(), Vec::new()));
    }
    node
}

// ============================================================================
// Block index
// ============================================================================

fn bench_integrity_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-index");
    group.measurement_time(Duration::from_secs(5));

    for len in [100u64, 1_000] {
        let node = seeded_node(&linear_chain(len));
        group.throughput(Throughput::Elements(len));
        group.bench_with_input(BenchmarkId::new("integrity_check", len), &node, |b, node| {
            b.iter(|| black_box(node.index.index_integrity_check()))
        });
    }

    group.finish();
}

// ============================================================================
// Chain selection
// ============================================================================

fn bench_try_connect(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain-selector");

    let chain = linear_chain(200);
    let node = seeded_node(&chain);
    let tip = chain.last().cloned().unwrap_or_else(genesis);
    let mut tag = 0u8;

    // Siblings on one tip; after 256 iterations the tags repeat and the
    // import short-circuits as already known.
    group.bench_function("try_connect_sibling", |b| {
        b.iter(|| {
            tag = tag.wrapping_add(1);
            let header = mining_child(&tip, 16, tag);
            black_box(
                node.selector
                    .try_connect(&Block::new(header, Vec::new())),
            )
        })
    });

    group.finish();
}

fn bench_validate_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("rules");

    let chain = linear_chain(500);
    let node = seeded_node(&chain);
    group.throughput(Throughput::Elements(chain.len() as u64));
    group.bench_function("validate_batch_500", |b| {
        b.iter(|| black_box(node.selector.validate_batch(&chain)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_integrity_check,
    bench_try_connect,
    bench_validate_batch,
);
criterion_main!(benches);
