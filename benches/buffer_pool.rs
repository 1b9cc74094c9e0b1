//! Buffer pool and hash index throughput.

use std::sync::Arc;

use bucketdb::{
    BufferPool, BufferPoolManagerInstance, DefaultKeyHasher, ExtendibleHashTable,
    MemoryDiskManager, OrdComparator, PageId, ShardedBufferPoolManager,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch_page_read");

    for &pool_size in &[16usize, 64] {
        let bpm = BufferPoolManagerInstance::new(pool_size, Arc::new(MemoryDiskManager::new()));
        let pages: Vec<PageId> = (0..64).map(|_| bpm.new_page_write().unwrap().page_id()).collect();

        group.bench_with_input(BenchmarkId::from_parameter(pool_size), &pages, |b, pages| {
            let mut i = 0;
            b.iter(|| {
                let guard = bpm.fetch_page_read(pages[i % pages.len()]).unwrap();
                black_box(guard.as_slice()[0]);
                i += 7;
            });
        });
    }

    group.finish();
}

fn bench_new_page_sharded(c: &mut Criterion) {
    let bpm = ShardedBufferPoolManager::new(4, 32, Arc::new(MemoryDiskManager::new()));

    c.bench_function("sharded_new_page", |b| {
        b.iter(|| {
            let page_id = bpm.new_page_write().unwrap().page_id();
            // keep the in-memory disk from growing without bound
            bpm.delete_page(black_box(page_id)).unwrap();
        });
    });
}

fn bench_hash_table(c: &mut Criterion) {
    let bpm = Arc::new(BufferPoolManagerInstance::new(
        128,
        Arc::new(MemoryDiskManager::new()),
    ));
    let table = ExtendibleHashTable::<i64, i64, _, _, _>::new(
        bpm,
        OrdComparator,
        DefaultKeyHasher::new(),
    )
    .unwrap();
    for key in 0..10_000i64 {
        table.insert(&key, &key).unwrap();
    }

    c.bench_function("hash_table_get_value", |b| {
        let mut key = 0i64;
        b.iter(|| {
            black_box(table.get_value(&(key % 10_000)).unwrap());
            key += 13;
        });
    });
}

criterion_group!(benches, bench_fetch, bench_new_page_sharded, bench_hash_table);
criterion_main!(benches);
