//! Hierarchy insertion/traversal benchmarks.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use memory_core::hierarchy::Hierarchy;

fn bench_create_message_chain(c: &mut Criterion) {
    c.bench_function("create_agent_session_message", |b| {
        b.iter(|| {
            let hierarchy = Hierarchy::in_memory(16);
            let agent = hierarchy.create_agent("bench-agent").unwrap();
            let session = hierarchy.create_session(agent.id, "bench-session").unwrap();
            let message_id = hierarchy.create_message(session.id).unwrap();
            black_box(message_id);
        });
    });
}

fn bench_get_children(c: &mut Criterion) {
    let hierarchy = Hierarchy::in_memory(16);
    let agent = hierarchy.create_agent("bench-agent").unwrap();
    let session = hierarchy.create_session(agent.id, "bench-session").unwrap();
    let message_id = hierarchy.create_message(session.id).unwrap();
    for _ in 0..200 {
        hierarchy.create_block(message_id).unwrap();
    }

    c.bench_function("get_children_200", |b| {
        b.iter(|| {
            let children = hierarchy.get_children(message_id, usize::MAX).unwrap();
            black_box(children.len());
        });
    });
}

criterion_group!(benches, bench_create_message_chain, bench_get_children);
criterion_main!(benches);
