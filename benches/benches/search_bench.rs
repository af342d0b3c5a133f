//! Search engine indexing/query benchmarks.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use memory_core::hierarchy::Level;
use memory_core::search::{SearchEngine, SearchEngineConfig, SearchQuery};

fn embedding(seed: u32, dim: usize) -> Vec<f32> {
    (0..dim)
        .map(|i| ((seed as f32 + i as f32).sin()))
        .collect()
}

fn bench_index(c: &mut Criterion) {
    c.bench_function("index_1000_statements", |b| {
        b.iter(|| {
            let engine = SearchEngine::new(SearchEngineConfig::default(), Default::default());
            for i in 0..1000u32 {
                let embedding = embedding(i, 16);
                engine
                    .index(
                        memory_core::hierarchy::NodeId(i),
                        Level::Statement,
                        Some(&embedding),
                        Some("sample statement text"),
                        u64::from(i),
                    )
                    .unwrap();
            }
            black_box(&engine);
        });
    });
}

fn bench_search(c: &mut Criterion) {
    let engine = SearchEngine::new(SearchEngineConfig::default(), Default::default());
    for i in 0..1000u32 {
        let embedding = embedding(i, 16);
        engine
            .index(
                memory_core::hierarchy::NodeId(i),
                Level::Statement,
                Some(&embedding),
                Some("sample statement text"),
                u64::from(i),
            )
            .unwrap();
    }
    let query_embedding = embedding(42, 16);

    c.bench_function("search_top_10_of_1000", |b| {
        b.iter(|| {
            let query = SearchQuery {
                embedding: Some(query_embedding.clone()),
                tokens: Some(vec!["sample".to_string()]),
                k: 10,
                min_level: Level::Statement,
                max_level: Level::Statement,
            };
            let hits = engine.search(&query, 1000).unwrap();
            black_box(hits.len());
        });
    });
}

criterion_group!(benches, bench_index, bench_search);
criterion_main!(benches);
