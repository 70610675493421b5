use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sable::perft::perft;
use sable::{parse_fen, STARTING_FEN};

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    fen: &'static str,
    depth: usize,
    nodes: u64,
}

const CASES: &[BenchCase] = &[
    BenchCase { name: "startpos", fen: STARTING_FEN, depth: 4, nodes: 197_281 },
    BenchCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        depth: 3,
        nodes: 97_862,
    },
    BenchCase {
        name: "endgame",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        depth: 4,
        nodes: 43_238,
    },
];

fn perft_bench(c: &mut Criterion) {
    sable::init();
    let mut group = c.benchmark_group("perft");
    group.sample_size(20);
    for case in CASES {
        group.throughput(Throughput::Elements(case.nodes));
        group.bench_with_input(BenchmarkId::from_parameter(case.name), case, |b, case| {
            let mut board = parse_fen(case.fen).unwrap();
            b.iter(|| {
                let nodes = perft(&mut board, case.depth);
                assert_eq!(nodes, case.nodes);
                black_box(nodes)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, perft_bench);
criterion_main!(benches);
