//! `query` — embed + tokenize the query string, search, and enrich hits
//! with truncated content previews (spec.md §4.5, §9's content-preview
//! byte cap).

use serde::Deserialize;
use serde_json::{Value, json};

use memory_core::constants::QUERY_CONTENT_PREVIEW_BYTES;
use memory_core::hierarchy::Level;
use memory_core::search::{SearchQuery, inverted::tokenize};

use crate::error::RpcError;
use crate::handlers::common::{level_name, parse_level, parse_params, preview};
use crate::state::MemoryService;

#[derive(Debug, Deserialize)]
struct QueryParams {
    query: String,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    top_level: Option<String>,
    #[serde(default)]
    bottom_level: Option<String>,
}

pub async fn query(service: &MemoryService, params: Option<Value>) -> Result<Value, RpcError> {
    let params: QueryParams = parse_params(params)?;

    let (min_level, max_level) = if let Some(name) = &params.level {
        let level = parse_level(name)?;
        (level, level)
    } else {
        let max_level = params
            .top_level
            .as_deref()
            .map(parse_level)
            .transpose()?
            .unwrap_or(Level::Session);
        let min_level = params
            .bottom_level
            .as_deref()
            .map(parse_level)
            .transpose()?
            .unwrap_or(Level::Statement);
        (min_level, max_level)
    };

    let k = params
        .max_results
        .unwrap_or(memory_core::constants::DEFAULT_MAX_RESULTS)
        .clamp(1, memory_core::constants::MAX_RESULTS_CAP);

    let embedding = service.embedder.embed(&params.query).await.ok();
    let tokens = tokenize(&params.query);

    let search_query = SearchQuery {
        embedding,
        tokens: Some(tokens),
        k: k + 1,
        min_level,
        max_level,
    };

    let mut hits = service.search.search(&search_query, MemoryService::now_ns())?;
    let truncated = hits.len() > k;
    hits.truncate(k);

    let mut results = Vec::with_capacity(hits.len());
    for hit in &hits {
        let info = service.hierarchy.get_node(hit.id)?;
        let text = service.hierarchy.get_text(hit.id)?.unwrap_or_default();
        let (content, _) = preview(&text, QUERY_CONTENT_PREVIEW_BYTES);
        let children_count = service.hierarchy.get_children(hit.id, usize::MAX)?.len();
        results.push(json!({
            "node_id": hit.id.0,
            "level": level_name(info.level),
            "score": hit.score,
            "content": content,
            "children_count": children_count,
        }));
    }

    Ok(json!({
        "results": results,
        "total_matches": results.len(),
        "top_level": level_name(max_level),
        "bottom_level": level_name(min_level),
        "truncated": truncated,
    }))
}
