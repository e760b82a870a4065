use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use corelib::ring::RingBuilder;
use corelib::{HashKind, Node};

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_owner");
    let keys: Vec<String> = (0..1024).map(|i| format!("user:{i}")).collect();

    for kind in [HashKind::Blake3, HashKind::Xxh3, HashKind::Sip] {
        for vnodes in [5usize, 256] {
            let ring = RingBuilder::new()
                .with_hash(kind)
                .with_vnodes(vnodes)
                .add_nodes((0..32).map(|i| Node::new(format!("http://10.0.0.{i}:8080"))))
                .build()
                .expect("ring");

            group.bench_with_input(
                BenchmarkId::new(kind.as_str(), vnodes),
                &ring,
                |b, ring| {
                    let mut i = 0usize;
                    b.iter(|| {
                        let key = &keys[i % keys.len()];
                        i += 1;
                        black_box(ring.get_owner(key.as_bytes()))
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_membership(c: &mut Criterion) {
    let ring = RingBuilder::new()
        .with_vnodes(256)
        .add_nodes((0..32).map(|i| Node::new(format!("http://10.0.0.{i}:8080"))))
        .build()
        .expect("ring");
    let extra = Node::new("http://10.0.1.1:8080");

    c.bench_function("add_remove_node", |b| {
        b.iter(|| {
            ring.add_node(extra.clone());
            ring.remove_node(&extra);
        })
    });
    c.bench_function("readd_present_node", |b| {
        b.iter(|| black_box(ring.add_node(Node::new("http://10.0.0.0:8080"))))
    });
}

criterion_group!(benches, bench_lookup, bench_membership);
criterion_main!(benches);
