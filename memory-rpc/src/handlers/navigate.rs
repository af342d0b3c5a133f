//! `drill_down`, `zoom_out`, `get_context` — tree navigation around a node,
//! grounded on spec.md §4.5's zoom-out sibling/ancestor caps.

use serde::Deserialize;
use serde_json::{Value, json};

use memory_core::constants::{MAX_RESULTS_CAP, ZOOM_OUT_MAX_SIBLINGS, ZOOM_OUT_SIBLING_PREVIEW_BYTES};
use memory_core::hierarchy::NodeId;

use crate::error::RpcError;
use crate::handlers::common::{level_name, parse_params, preview};
use crate::state::MemoryService;

#[derive(Debug, Deserialize)]
struct DrillDownParams {
    id: u32,
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    max_results: Option<usize>,
}

/// List `id`'s children, optionally filtered by a case-insensitive
/// substring match against each child's text.
pub async fn drill_down(service: &MemoryService, params: Option<Value>) -> Result<Value, RpcError> {
    let params: DrillDownParams = parse_params(params)?;
    let node = NodeId(params.id);
    let max_results = params.max_results.unwrap_or(MAX_RESULTS_CAP).clamp(1, MAX_RESULTS_CAP);

    let mut children = service.hierarchy.get_children(node, usize::MAX)?;

    if let Some(filter) = &params.filter {
        let needle = filter.to_lowercase();
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            let text = service.hierarchy.get_text(child)?.unwrap_or_default();
            let haystack = String::from_utf8_lossy(&text).to_lowercase();
            if haystack.contains(&needle) {
                kept.push(child);
            }
        }
        children = kept;
    }

    let total_matches = children.len();
    children.truncate(max_results);

    let ids: Vec<u32> = children.iter().map(|id| id.0).collect();
    Ok(json!({ "ids": ids, "total_matches": total_matches }))
}

#[derive(Debug, Deserialize)]
struct ZoomOutParams {
    id: u32,
}

/// Return `id`'s ancestors (immediate parent first, up to the session
/// root) and up to [`ZOOM_OUT_MAX_SIBLINGS`] siblings with short previews.
pub async fn zoom_out(service: &MemoryService, params: Option<Value>) -> Result<Value, RpcError> {
    let params: ZoomOutParams = parse_params(params)?;
    let node = NodeId(params.id);

    let info = service.hierarchy.get_node(node)?;
    let ancestors = service.hierarchy.get_ancestors(node, usize::MAX)?;
    let siblings = service.hierarchy.get_siblings(node, ZOOM_OUT_MAX_SIBLINGS)?;

    let mut ancestor_json = Vec::with_capacity(ancestors.len());
    for ancestor in ancestors {
        let ancestor_info = service.hierarchy.get_node(ancestor)?;
        ancestor_json.push(json!({ "id": ancestor.0, "level": level_name(ancestor_info.level) }));
    }

    let mut sibling_json = Vec::with_capacity(siblings.len());
    for sibling in siblings {
        let text = service.hierarchy.get_text(sibling)?.unwrap_or_default();
        let (content, _) = preview(&text, ZOOM_OUT_SIBLING_PREVIEW_BYTES);
        sibling_json.push(json!({ "id": sibling.0, "preview": content }));
    }

    Ok(json!({
        "node": { "id": node.0, "level": level_name(info.level) },
        "ancestors": ancestor_json,
        "siblings": sibling_json,
    }))
}

#[derive(Debug, Deserialize)]
struct GetContextParams {
    node_id: u32,
    #[serde(default = "default_true")]
    include_parent: bool,
    #[serde(default = "default_true")]
    include_children: bool,
    #[serde(default = "default_true")]
    include_siblings: bool,
}

fn default_true() -> bool {
    true
}

/// Return a node plus whichever of its parent/children/siblings the
/// caller asked for (all three default to on).
pub async fn get_context(service: &MemoryService, params: Option<Value>) -> Result<Value, RpcError> {
    let params: GetContextParams = parse_params(params)?;
    let node = NodeId(params.node_id);
    let info = service.hierarchy.get_node(node)?;
    let text = service.hierarchy.get_text(node)?.unwrap_or_default();

    let mut response = json!({
        "node": {
            "id": node.0,
            "level": level_name(info.level),
            "content": String::from_utf8_lossy(&text),
        },
    });

    if params.include_parent && info.parent_id.is_valid() {
        let parent_info = service.hierarchy.get_node(info.parent_id)?;
        response["parent"] = json!({ "id": info.parent_id.0, "level": level_name(parent_info.level) });
    }

    if params.include_children {
        let children = service.hierarchy.get_children(node, MAX_RESULTS_CAP)?;
        response["children"] = json!(children.iter().map(|id| id.0).collect::<Vec<_>>());
    }

    if params.include_siblings {
        let siblings = service.hierarchy.get_siblings(node, ZOOM_OUT_MAX_SIBLINGS)?;
        response["siblings"] = json!(siblings.iter().map(|id| id.0).collect::<Vec<_>>());
    }

    Ok(response)
}
