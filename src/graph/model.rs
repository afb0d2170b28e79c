use std::collections::{BTreeMap, HashMap, HashSet};

use eframe::egui::Color32;
use serde_json::Value;

use super::style::GlyphKey;

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Primary kind first.
    pub kinds: Vec<String>,
    pub size: f32,
    pub color: Color32,
    pub icon: Option<GlyphKey>,
    pub high_value: bool,
    pub object_id: Option<String>,
    pub last_seen: Option<String>,
    pub properties: BTreeMap<String, Value>,
}

impl GraphNode {
    pub fn primary_kind(&self) -> &str {
        self.kinds.first().map(String::as_str).unwrap_or("Unknown")
    }
}

/// Identity of an edge. Parallel edges of different kinds share endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: String,
    pub target: String,
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: String,
    pub label: String,
    pub color: Color32,
    pub last_seen: Option<String>,
    pub impact_percent: Option<f64>,
    /// Composite impact placed on `0..=100` relative to the rest of the result.
    pub impact_weighted: Option<f64>,
    /// Line width as a multiple of the viewer's base edge width.
    pub width: f32,
    /// Position of the edge along a pathfinding result.
    pub path_step: Option<usize>,
    pub properties: BTreeMap<String, Value>,
}

impl GraphEdge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source.clone(),
            target: self.target.clone(),
            kind: self.kind.clone(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn has_key(&self, key: &EdgeKey) -> bool {
        self.source == key.source && self.target == key.target && self.kind == key.kind
    }
}

/// Render-ready graph: nodes keyed by id plus an ordered edge list.
///
/// Every edge references two nodes of the same response. The constructor
/// enforces that, so a value of this type never carries dangling edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatGraphResponse {
    nodes: HashMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
}

impl FlatGraphResponse {
    pub fn new(
        nodes: impl IntoIterator<Item = GraphNode>,
        edges: impl IntoIterator<Item = GraphEdge>,
    ) -> Self {
        let mut node_map = HashMap::new();
        for node in nodes {
            node_map.entry(node.id.clone()).or_insert(node);
        }

        let mut seen = HashSet::new();
        let mut dropped = 0usize;
        let edges = edges
            .into_iter()
            .filter(|edge| {
                let resolves =
                    node_map.contains_key(&edge.source) && node_map.contains_key(&edge.target);
                if !resolves {
                    dropped += 1;
                    return false;
                }
                seen.insert(edge.key())
            })
            .collect::<Vec<_>>();

        if dropped > 0 {
            tracing::debug!(dropped, "dropped edges with unresolved endpoints");
        }

        Self {
            nodes: node_map,
            edges,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &HashMap<String, GraphNode> {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Restyling access for normalization. Keys must stay unchanged.
    pub(super) fn edges_mut(&mut self) -> &mut [GraphEdge] {
        &mut self.edges
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.has_key(key))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids sorted, for deterministic iteration over the map.
    pub fn sorted_node_ids(&self) -> Vec<&str> {
        let mut ids = self.nodes.keys().map(String::as_str).collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    pub fn into_parts(self) -> (HashMap<String, GraphNode>, Vec<GraphEdge>) {
        (self.nodes, self.edges)
    }
}
