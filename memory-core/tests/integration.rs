//! End-to-end scenarios S1-S6, exercised directly against the public
//! `Hierarchy`/`SearchEngine`/`decompose` API together.

use std::sync::Arc;
use std::thread;

use memory_core::decomposer::{BlockKind, decompose};
use memory_core::hierarchy::{Hierarchy, Level};
use memory_core::search::{SearchEngine, SearchEngineConfig, SearchQuery};

fn fake_embedding(seed: u8, dim: usize) -> Vec<f32> {
    (0..dim).map(|i| f32::from(seed.wrapping_add(i as u8)) / 255.0).collect()
}

#[test]
fn s1_ingest_then_query() {
    let hierarchy = Hierarchy::in_memory(8);
    let search = SearchEngine::new(SearchEngineConfig::default(), Default::default());

    let agent = hierarchy.create_agent("a").unwrap();
    let session = hierarchy.create_session(agent.id, "s").unwrap();
    assert!(session.created);
    let message_id = hierarchy.create_message(session.id).unwrap();

    let content = "Alpha beta gamma. Delta epsilon.";
    hierarchy.set_text(message_id, content.as_bytes()).unwrap();
    search.index(message_id, Level::Message, Some(&fake_embedding(1, 8)), Some(content), 0).unwrap();

    let blocks = decompose(content.as_bytes());
    assert_eq!(blocks.len(), 1);
    let block = &blocks[0];
    assert_eq!(block.statements.len(), 2);

    let block_id = hierarchy.create_block(message_id).unwrap();
    let block_text = String::from_utf8_lossy(block.content.bytes).into_owned();
    hierarchy.set_text(block_id, block_text.as_bytes()).unwrap();
    search.index(block_id, Level::Block, Some(&fake_embedding(2, 8)), Some(&block_text), 0).unwrap();

    let mut statement_ids = Vec::new();
    for statement in &block.statements {
        let statement_id = hierarchy.create_statement(block_id).unwrap();
        let text = String::from_utf8_lossy(statement.bytes).into_owned();
        hierarchy.set_text(statement_id, text.as_bytes()).unwrap();
        search.index(statement_id, Level::Statement, Some(&fake_embedding(3, 8)), Some(&text), 0).unwrap();
        statement_ids.push(statement_id);
    }

    let query = SearchQuery {
        embedding: None,
        tokens: Some(vec!["delta".to_string()]),
        k: 10,
        min_level: Level::Statement,
        max_level: Level::Statement,
    };
    let hits = search.search(&query, 0).unwrap();
    assert_eq!(hits.len(), 1);
    let text = hierarchy.get_text(hits[0].id).unwrap().unwrap();
    assert!(String::from_utf8_lossy(&text).starts_with("Delta"));
}

#[test]
fn s2_code_block_decomposition() {
    let content = "intro\n\n```python\na=1\nb=2\n```\nafter";
    let blocks = decompose(content.as_bytes());
    assert_eq!(blocks.len(), 3);

    assert_eq!(blocks[0].kind, BlockKind::Text);
    assert_eq!(blocks[0].content.bytes, b"intro");

    assert_eq!(blocks[1].kind, BlockKind::Code);
    assert_eq!(blocks[1].lang.as_deref(), Some("python"));
    let statements: Vec<&[u8]> = blocks[1].statements.iter().map(|s| s.bytes).collect();
    assert_eq!(statements, vec![b"a=1".as_slice(), b"b=2".as_slice()]);

    assert_eq!(blocks[2].kind, BlockKind::Text);
    assert_eq!(blocks[2].content.bytes, b"after");
}

#[test]
fn s3_drill_down_filter_is_case_insensitive() {
    let hierarchy = Hierarchy::in_memory(4);
    let agent = hierarchy.create_agent("a").unwrap();
    let session = hierarchy.create_session(agent.id, "s").unwrap();
    let message_id = hierarchy.create_message(session.id).unwrap();
    let block_id = hierarchy.create_block(message_id).unwrap();

    let apple_pie = hierarchy.create_statement(block_id).unwrap();
    hierarchy.set_text(apple_pie, b"apple pie").unwrap();
    let banana = hierarchy.create_statement(block_id).unwrap();
    hierarchy.set_text(banana, b"banana").unwrap();
    let apple_juice = hierarchy.create_statement(block_id).unwrap();
    hierarchy.set_text(apple_juice, b"apple juice").unwrap();

    let children = hierarchy.get_children(block_id, usize::MAX).unwrap();
    let matches: Vec<_> = children
        .into_iter()
        .filter(|id| {
            let text = hierarchy.get_text(*id).unwrap().unwrap();
            String::from_utf8_lossy(&text).to_lowercase().contains("apple")
        })
        .collect();
    assert_eq!(matches, vec![apple_pie, apple_juice]);
}

#[test]
fn s4_zoom_out_ancestor_chain() {
    let hierarchy = Hierarchy::in_memory(4);
    let agent = hierarchy.create_agent("a").unwrap();
    let session = hierarchy.create_session(agent.id, "s").unwrap();
    let message_id = hierarchy.create_message(session.id).unwrap();
    let block_id = hierarchy.create_block(message_id).unwrap();
    let statement_id = hierarchy.create_statement(block_id).unwrap();

    let ancestors = hierarchy.get_ancestors(statement_id, usize::MAX).unwrap();
    assert_eq!(ancestors, vec![block_id, message_id, session.id]);
}

#[test]
fn s5_abbreviation_handling_does_not_oversplit() {
    let content = "Ask Dr. Smith about i.e. the plan. Then leave.";
    let blocks = decompose(content.as_bytes());
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].statements.len(), 2);
}

#[test]
fn s6_concurrent_insert_under_one_session() {
    let hierarchy = Arc::new(Hierarchy::in_memory(4));
    let agent = hierarchy.create_agent("a").unwrap();
    let session = hierarchy.create_session(agent.id, "s").unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let hierarchy = Arc::clone(&hierarchy);
            let session_id = session.id;
            thread::spawn(move || {
                for _ in 0..100 {
                    hierarchy.create_message(session_id).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let children = hierarchy.get_children(session.id, usize::MAX).unwrap();
    assert_eq!(children.len(), 1000);
    let unique: std::collections::HashSet<_> = children.iter().collect();
    assert_eq!(unique.len(), 1000);
}
