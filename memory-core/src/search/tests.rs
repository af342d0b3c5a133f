use super::*;

fn unit(vals: &[f32]) -> Vec<f32> {
    let norm: f32 = vals.iter().map(|v| v * v).sum::<f32>().sqrt();
    vals.iter().map(|v| v / norm).collect()
}

fn engine() -> SearchEngine {
    SearchEngine::new(SearchEngineConfig::default(), RankingWeights::default())
}

#[test]
fn indexed_embedding_is_found_in_its_level() {
    let engine = engine();
    engine
        .index(NodeId(0), Level::Statement, Some(&unit(&[1.0, 0.0])), Some("alpha"), 1000)
        .unwrap();
    let query = SearchQuery {
        embedding: Some(unit(&[1.0, 0.0])),
        tokens: None,
        k: 5,
        min_level: Level::Statement,
        max_level: Level::Statement,
    };
    let hits = engine.search(&query, 2000).unwrap();
    assert!(hits.iter().any(|h| h.id == NodeId(0)));
}

#[test]
fn scores_are_bounded_and_finite() {
    let engine = engine();
    for i in 0..10u32 {
        let angle = i as f32 * 0.3;
        engine
            .index(
                NodeId(i),
                Level::Statement,
                Some(&unit(&[angle.cos(), angle.sin()])),
                Some("alpha beta"),
                1_000_000 * u64::from(i),
            )
            .unwrap();
    }
    let query = SearchQuery {
        embedding: Some(unit(&[1.0, 0.0])),
        tokens: Some(vec!["alpha".to_string()]),
        k: 10,
        min_level: Level::Statement,
        max_level: Level::Session,
    };
    let hits = engine.search(&query, 5_000_000).unwrap();
    for hit in hits {
        assert!(hit.score.is_finite());
        assert!(hit.score >= 0.0 && hit.score <= 1.1);
    }
}

#[test]
fn soft_delete_excludes_from_all_future_searches() {
    let engine = engine();
    engine
        .index(NodeId(0), Level::Statement, Some(&unit(&[1.0, 0.0])), Some("alpha"), 1000)
        .unwrap();
    engine.tombstone(NodeId(0));
    let query = SearchQuery {
        embedding: Some(unit(&[1.0, 0.0])),
        tokens: Some(vec!["alpha".to_string()]),
        k: 10,
        min_level: Level::Statement,
        max_level: Level::Session,
    };
    let hits = engine.search(&query, 2000).unwrap();
    assert!(!hits.iter().any(|h| h.id == NodeId(0)));
}

#[test]
fn level_filter_is_respected() {
    let engine = engine();
    engine
        .index(NodeId(0), Level::Statement, Some(&unit(&[1.0, 0.0])), None, 1000)
        .unwrap();
    engine
        .index(NodeId(1), Level::Session, Some(&unit(&[1.0, 0.0])), None, 1000)
        .unwrap();
    let query = SearchQuery {
        embedding: Some(unit(&[1.0, 0.0])),
        tokens: None,
        k: 10,
        min_level: Level::Statement,
        max_level: Level::Statement,
    };
    let hits = engine.search(&query, 2000).unwrap();
    assert!(hits.iter().all(|h| h.id != NodeId(1)));
}

#[test]
fn inverted_min_level_greater_than_max_is_rejected() {
    let engine = engine();
    let query = SearchQuery {
        embedding: None,
        tokens: Some(vec!["x".to_string()]),
        k: 10,
        min_level: Level::Session,
        max_level: Level::Statement,
    };
    assert!(matches!(engine.search(&query, 0), Err(Error::InvalidArg(_))));
}

#[test]
fn newer_doc_outranks_older_identical_doc() {
    let engine = engine();
    engine
        .index(NodeId(0), Level::Statement, Some(&unit(&[1.0, 0.0])), Some("alpha"), 0)
        .unwrap();
    engine
        .index(NodeId(1), Level::Statement, Some(&unit(&[1.0, 0.0])), Some("alpha"), 3_600_000_000_000)
        .unwrap();
    let query = SearchQuery {
        embedding: Some(unit(&[1.0, 0.0])),
        tokens: Some(vec!["alpha".to_string()]),
        k: 10,
        min_level: Level::Statement,
        max_level: Level::Statement,
    };
    let hits = engine.search(&query, 3_600_000_000_000).unwrap();
    let newer_score = hits.iter().find(|h| h.id == NodeId(1)).unwrap().score;
    let older_score = hits.iter().find(|h| h.id == NodeId(0)).unwrap().score;
    assert!(newer_score > older_score);
}

#[test]
fn empty_index_search_returns_empty_ok() {
    let engine = engine();
    let query = SearchQuery {
        embedding: Some(unit(&[1.0, 0.0])),
        tokens: Some(vec!["nope".to_string()]),
        k: 10,
        min_level: Level::Statement,
        max_level: Level::Session,
    };
    assert!(engine.search(&query, 0).unwrap().is_empty());
}

#[test]
fn rebuild_from_hierarchy_restores_semantic_search() {
    let hierarchy = Hierarchy::in_memory(2);
    let agent = hierarchy.create_agent("a").unwrap().id;
    let session = hierarchy.create_session(agent, "s").unwrap().id;
    hierarchy.set_embedding(session, &[1.0, 0.0]).unwrap();

    let engine = engine();
    engine.rebuild_from_hierarchy(&hierarchy).unwrap();

    let query = SearchQuery {
        embedding: Some(vec![1.0, 0.0]),
        tokens: None,
        k: 5,
        min_level: Level::Session,
        max_level: Level::Session,
    };
    let hits = engine.search(&query, 1).unwrap();
    assert!(hits.iter().any(|h| h.id == session));
}
