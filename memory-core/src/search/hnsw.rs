//! One Hierarchical Navigable Small World graph, covering a single
//! `Level`'s nodes.
//!
//! Candidate queues follow the heap-based beam search shape used by
//! `ahnlich`'s HNSW module: a min-heap of unexplored candidates and a
//! bounded max-heap of the best-so-far results, both ordered by an
//! `OrderedNode(id, distance)` newtype so `f32` comparisons never need a
//! bare `partial_cmp().unwrap()` at the call site.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use rand::RngCore;
use rand_chacha::ChaCha8Rng;

use crate::constants::MAX_HNSW_LAYERS;
use crate::error::{Error, Result};
use crate::hierarchy::NodeId;

#[derive(Debug, Clone, Copy)]
struct OrderedNode(NodeId, f32);

impl PartialEq for OrderedNode {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}
impl Eq for OrderedNode {}
impl PartialOrd for OrderedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.1.partial_cmp(&other.1).unwrap_or(Ordering::Equal)
    }
}

struct HnswNode {
    vector: Vec<f32>,
    neighbors: Vec<Vec<NodeId>>,
    tombstoned: bool,
}

/// Cosine distance for unit-length vectors: `1 - dot(a, b)`.
fn distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    1.0 - dot
}

/// Draws `U ∈ (0,1]` from the reproducible PRNG and returns
/// `⌊−ln(U)·(1/ln M)⌋`, clamped to `MAX_HNSW_LAYERS − 1`.
fn assign_layer(rng: &mut ChaCha8Rng, m: usize) -> usize {
    let bits = rng.next_u64() >> 11; // top 53 bits, matching f64's mantissa width
    let max = (1u64 << 53) as f64;
    let u = ((bits as f64) / max).max(1e-12);
    let inv_log_m = 1.0 / (m as f64).ln();
    let layer = (-(u.ln()) * inv_log_m).floor();
    (layer.max(0.0) as usize).min(MAX_HNSW_LAYERS - 1)
}

/// Graph parameters for one level's index.
#[derive(Debug, Clone, Copy)]
pub struct HnswConfig {
    /// Max neighbors per node at layers above 0 (layer 0 uses `2 * m`).
    pub m: usize,
    /// Beam width used while inserting.
    pub ef_construction: usize,
    /// Beam width used while searching.
    pub ef_search: usize,
    /// Hard cap on the number of vectors this index accepts.
    pub capacity: usize,
}

/// One level's HNSW graph.
pub struct HnswIndex {
    config: HnswConfig,
    nodes: HashMap<NodeId, HnswNode>,
    entry_point: Option<NodeId>,
    max_layer: usize,
}

impl HnswIndex {
    /// Create an empty index with the given parameters.
    #[must_use]
    pub fn new(config: HnswConfig) -> Self {
        Self {
            config,
            nodes: HashMap::new(),
            entry_point: None,
            max_layer: 0,
        }
    }

    /// Insert `id` with `vector`, assigning its layer from `rng`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArg`] for an empty vector,
    /// [`Error::Exists`] for a duplicate id, and [`Error::Full`] at capacity.
    pub fn insert(&mut self, id: NodeId, vector: Vec<f32>, rng: &mut ChaCha8Rng) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::InvalidArg("embedding must be non-empty".to_string()));
        }
        if self.nodes.contains_key(&id) {
            return Err(Error::Exists(format!("node {id} already indexed")));
        }
        if self.nodes.len() >= self.config.capacity {
            return Err(Error::Full("hnsw index at capacity".to_string()));
        }

        let layer = assign_layer(rng, self.config.m);
        let node = HnswNode {
            vector: vector.clone(),
            neighbors: vec![Vec::new(); layer + 1],
            tombstoned: false,
        };

        let Some(entry_point) = self.entry_point else {
            self.nodes.insert(id, node);
            self.entry_point = Some(id);
            self.max_layer = layer;
            return Ok(());
        };

        let mut ep = entry_point;
        let mut ep_layer = self.max_layer;
        while ep_layer > layer {
            ep = self.greedy_nearest(ep, &vector, ep_layer);
            ep_layer -= 1;
        }

        self.nodes.insert(id, node);

        let mut entry_points = vec![ep];
        for lc in (0..=layer.min(self.max_layer)).rev() {
            let candidates = self.search_layer(&vector, &entry_points, self.config.ef_construction, lc);
            let max_conn = if lc == 0 { 2 * self.config.m } else { self.config.m };
            let selected: Vec<NodeId> = candidates.iter().take(max_conn).map(|(nid, _)| *nid).collect();
            for &neighbor in &selected {
                self.connect(id, neighbor, lc, max_conn);
                self.connect(neighbor, id, lc, max_conn);
            }
            entry_points = candidates.into_iter().map(|(nid, _)| nid).collect();
            if entry_points.is_empty() {
                entry_points = vec![ep];
            }
        }

        if layer > self.max_layer {
            self.entry_point = Some(id);
            self.max_layer = layer;
        }
        Ok(())
    }

    /// Approximate nearest-neighbor search, returning `(id, distance)`
    /// pairs sorted ascending by distance, capped at `k`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArg`] for an empty query vector.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(NodeId, f32)>> {
        if query.is_empty() {
            return Err(Error::InvalidArg("query embedding must be non-empty".to_string()));
        }
        let Some(entry_point) = self.entry_point else {
            return Ok(Vec::new());
        };
        let mut ep = entry_point;
        for layer in (1..=self.max_layer).rev() {
            ep = self.greedy_nearest(ep, query, layer);
        }
        let ef = self.config.ef_search.max(k);
        let mut results = self.search_layer(query, &[ep], ef, 0);
        results.retain(|(id, _)| self.nodes.get(id).is_some_and(|n| !n.tombstoned));
        results.truncate(k);
        Ok(results)
    }

    /// Soft-delete `id`: it stops appearing in search results but its
    /// neighbor slots are never reclaimed (see `DESIGN.md`).
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` is not indexed.
    pub fn tombstone(&mut self, id: NodeId) -> Result<()> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("node {id} not in hnsw index")))?
            .tombstoned = true;
        Ok(())
    }

    /// Whether `id` is indexed and not tombstoned.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| !n.tombstoned)
    }

    /// Count of non-tombstoned nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.nodes.values().filter(|n| !n.tombstoned).count()
    }

    fn greedy_nearest(&self, start: NodeId, query: &[f32], layer: usize) -> NodeId {
        let mut current = start;
        let mut current_dist = self
            .nodes
            .get(&current)
            .map_or(f32::MAX, |n| distance(query, &n.vector));
        loop {
            let mut improved = false;
            if let Some(node) = self.nodes.get(&current) {
                if layer < node.neighbors.len() {
                    for &neighbor in &node.neighbors[layer] {
                        if let Some(neighbor_node) = self.nodes.get(&neighbor) {
                            if neighbor_node.tombstoned {
                                continue;
                            }
                            let d = distance(query, &neighbor_node.vector);
                            if d < current_dist {
                                current = neighbor;
                                current_dist = d;
                                improved = true;
                            }
                        }
                    }
                }
            }
            if !improved {
                break;
            }
        }
        current
    }

    fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[NodeId],
        ef: usize,
        layer: usize,
    ) -> Vec<(NodeId, f32)> {
        let mut visited: HashSet<NodeId> = entry_points.iter().copied().collect();
        let mut candidates: BinaryHeap<std::cmp::Reverse<OrderedNode>> = BinaryHeap::new();
        let mut found: BinaryHeap<OrderedNode> = BinaryHeap::new();

        for &ep in entry_points {
            if let Some(node) = self.nodes.get(&ep) {
                if node.tombstoned {
                    continue;
                }
                let d = distance(query, &node.vector);
                candidates.push(std::cmp::Reverse(OrderedNode(ep, d)));
                found.push(OrderedNode(ep, d));
            }
        }

        while let Some(std::cmp::Reverse(current)) = candidates.pop() {
            if let Some(worst) = found.peek() {
                if found.len() >= ef && current.1 > worst.1 {
                    break;
                }
            }
            let Some(node) = self.nodes.get(&current.0) else {
                continue;
            };
            if layer >= node.neighbors.len() {
                continue;
            }
            for &neighbor in &node.neighbors[layer] {
                if !visited.insert(neighbor) {
                    continue;
                }
                let Some(neighbor_node) = self.nodes.get(&neighbor) else {
                    continue;
                };
                if neighbor_node.tombstoned {
                    continue;
                }
                let d = distance(query, &neighbor_node.vector);
                let should_add = found.len() < ef || found.peek().is_some_and(|w| d < w.1);
                if should_add {
                    candidates.push(std::cmp::Reverse(OrderedNode(neighbor, d)));
                    found.push(OrderedNode(neighbor, d));
                    if found.len() > ef {
                        found.pop();
                    }
                }
            }
        }

        let mut result: Vec<(NodeId, f32)> = found.into_iter().map(|o| (o.0, o.1)).collect();
        result.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        result
    }

    fn connect(&mut self, a: NodeId, b: NodeId, layer: usize, max_conn: usize) {
        if !self.nodes.contains_key(&b) {
            return;
        }
        let Some(a_vector) = self.nodes.get(&a).map(|n| n.vector.clone()) else {
            return;
        };
        let mut neighbor_ids: Vec<NodeId> = self
            .nodes
            .get(&a)
            .filter(|n| layer < n.neighbors.len())
            .map(|n| n.neighbors[layer].clone())
            .unwrap_or_default();
        if neighbor_ids.contains(&b) {
            return;
        }
        neighbor_ids.push(b);
        if neighbor_ids.len() > max_conn {
            let mut scored: Vec<(NodeId, f32)> = neighbor_ids
                .iter()
                .filter_map(|&nid| self.nodes.get(&nid).map(|n| (nid, distance(&a_vector, &n.vector))))
                .collect();
            scored.sort_by(|x, y| x.1.partial_cmp(&y.1).unwrap_or(Ordering::Equal));
            scored.truncate(max_conn);
            neighbor_ids = scored.into_iter().map(|(nid, _)| nid).collect();
        }
        if let Some(a_node) = self.nodes.get_mut(&a) {
            if layer >= a_node.neighbors.len() {
                a_node.neighbors.resize(layer + 1, Vec::new());
            }
            a_node.neighbors[layer] = neighbor_ids;
        }
    }
}
