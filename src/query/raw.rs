use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::graph::normalize::{edge_from_wire, node_from_wire};
use crate::graph::style::parse_color;
use crate::graph::FlatGraphResponse;

use super::QueryKind;

/// Prefix that marks relationship entries in a flat record.
pub const EDGE_KEY_PREFIX: &str = "rel_";

#[derive(Debug, Error)]
pub enum RawResultError {
    #[error("query result is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object for a {kind} result")]
    NotAnObject { kind: QueryKind },
    #[error("malformed {kind} result")]
    Shape {
        kind: QueryKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Node as the query API sends it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNode {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: String,
    /// Older producers name the kind here instead of in `kind`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nodetype: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default)]
    pub is_tier_zero: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

/// Edge as the query API sends it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEdge {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_weighted: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

/// Structured graph returned by cypher, composition and pathfinding queries.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: BTreeMap<String, WireNode>,
    #[serde(default)]
    pub edges: Vec<WireEdge>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TextLabel {
    #[serde(default)]
    pub text: String,
}

/// Node entry of a flat record.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatNodeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub data: WireNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_icon: Option<TextLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<TextLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
}

/// Relationship entry of a flat record, keyed `rel_*`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct FlatEdgeEntry {
    #[serde(default)]
    pub id1: String,
    #[serde(default)]
    pub id2: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<TextLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default)]
    pub data: WireEdge,
}

/// Raw query result, one variant per query kind.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResult {
    Node(FlatGraphResponse),
    Relationship(FlatGraphResponse),
    Cypher(GraphData),
    Composition(GraphData),
    Pathfinding(GraphData),
}

/// Entry counts of a raw result before normalization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawCounts {
    pub nodes: usize,
    pub edges: usize,
}

impl QueryResult {
    /// Decodes a result for the query kind named by `tag`. Unknown tags are
    /// not an error and yield `None`.
    pub fn decode(tag: &str, value: Value) -> Result<Option<Self>, RawResultError> {
        let Some(kind) = QueryKind::from_tag(tag) else {
            tracing::warn!(tag, "unknown query kind");
            return Ok(None);
        };
        Self::decode_kind(kind, value).map(Some)
    }

    pub fn decode_str(tag: &str, json: &str) -> Result<Option<Self>, RawResultError> {
        let value = serde_json::from_str(json)?;
        Self::decode(tag, value)
    }

    pub fn decode_kind(kind: QueryKind, value: Value) -> Result<Self, RawResultError> {
        let value = unwrap_envelope(value);
        if !value.is_object() {
            return Err(RawResultError::NotAnObject { kind });
        }

        let graph_data = |value: Value| {
            serde_json::from_value::<GraphData>(value)
                .map_err(|source| RawResultError::Shape { kind, source })
        };

        Ok(match kind {
            QueryKind::Node => Self::Node(decode_flat(value)),
            QueryKind::Relationship => Self::Relationship(decode_flat(value)),
            QueryKind::Cypher => Self::Cypher(graph_data(value)?),
            QueryKind::Composition => Self::Composition(graph_data(value)?),
            QueryKind::Pathfinding => Self::Pathfinding(graph_data(value)?),
        })
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Self::Node(_) => QueryKind::Node,
            Self::Relationship(_) => QueryKind::Relationship,
            Self::Cypher(_) => QueryKind::Cypher,
            Self::Composition(_) => QueryKind::Composition,
            Self::Pathfinding(_) => QueryKind::Pathfinding,
        }
    }

    pub fn raw_counts(&self) -> RawCounts {
        match self {
            Self::Node(graph) | Self::Relationship(graph) => RawCounts {
                nodes: graph.node_count(),
                edges: graph.edge_count(),
            },
            Self::Cypher(data) | Self::Composition(data) | Self::Pathfinding(data) => RawCounts {
                nodes: data.nodes.len(),
                edges: data.edges.len(),
            },
        }
    }
}

/// Responses may arrive wrapped as `{"data": {...}}`.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map)
            if map.len() == 1 && map.get("data").is_some_and(Value::is_object) =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Entries that fail to decode are skipped, not fatal.
fn decode_flat(value: Value) -> FlatGraphResponse {
    let Value::Object(entries) = value else {
        return FlatGraphResponse::empty();
    };

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut skipped = 0usize;

    for (key, entry) in entries {
        if key.starts_with(EDGE_KEY_PREFIX) && is_relationship_entry(&entry) {
            let Ok(entry) = serde_json::from_value::<FlatEdgeEntry>(entry) else {
                skipped += 1;
                continue;
            };
            let source = non_empty_or(entry.id1, &entry.data.source);
            let target = non_empty_or(entry.id2, &entry.data.target);
            let label = entry.label.as_ref().map(|label| label.text.as_str());
            let color = entry.color.as_deref().and_then(parse_color);
            let mut edge = edge_from_wire(&entry.data, source, target, label, color);
            if let Some(width) = entry.width.filter(|width| width.is_finite() && *width > 0.0) {
                edge.width = width;
            }
            edges.push(edge);
        } else {
            let Ok(entry) = serde_json::from_value::<FlatNodeEntry>(entry) else {
                skipped += 1;
                continue;
            };
            let color = entry.color.as_deref().and_then(parse_color);
            let font_icon = entry.font_icon.as_ref().map(|icon| icon.text.as_str());
            let mut wire = entry.data;
            if wire.label.trim().is_empty()
                && let Some(label) = &entry.label
            {
                wire.label = label.text.clone();
            }
            nodes.push(node_from_wire(&key, &wire, entry.size, color, font_icon));
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped malformed flat record entries");
    }

    FlatGraphResponse::new(nodes, edges)
}

/// Node ids may start with the relationship prefix too; relationships are
/// the entries that name their endpoints.
fn is_relationship_entry(entry: &Value) -> bool {
    entry.get("id1").is_some()
        || entry.get("id2").is_some()
        || entry.pointer("/data/source").is_some()
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_owned()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::graph::style::{GlyphKey, node_color};

    #[test]
    fn unknown_tag_decodes_to_nothing() {
        let decoded = QueryResult::decode("saved-query", json!({"nodes": {}}))
            .expect("unknown tags are not errors");
        assert!(decoded.is_none());
    }

    #[test]
    fn structured_result_with_envelope() {
        let value = json!({
            "data": {
                "nodes": {
                    "1": {"label": "ALICE@CORP", "kind": "User", "objectId": "S-1-5-21-1"},
                    "2": {"label": "DOMAIN ADMINS@CORP", "kind": "Group", "isTierZero": true}
                },
                "edges": [
                    {"source": "1", "target": "2", "label": "MemberOf", "kind": "MemberOf"}
                ],
                "node_keys": ["name"]
            }
        });

        let decoded = QueryResult::decode("cypher", value)
            .expect("valid result")
            .expect("known kind");
        let QueryResult::Cypher(data) = &decoded else {
            panic!("expected a cypher result, got {decoded:?}");
        };

        assert_eq!(data.nodes.len(), 2);
        assert_eq!(data.nodes["1"].object_id.as_deref(), Some("S-1-5-21-1"));
        assert!(data.nodes["2"].is_tier_zero);
        assert_eq!(data.edges[0].kind, "MemberOf");
        assert_eq!(decoded.raw_counts(), RawCounts { nodes: 2, edges: 1 });
    }

    #[test]
    fn flat_record_splits_nodes_and_relationships() {
        let value = json!({
            "1": {
                "color": "#17E625",
                "data": {"label": "ALICE@CORP", "kind": "User"},
                "fontIcon": {"text": "fa-user"},
                "size": 1.5
            },
            "2": {
                "data": {"kind": "Computer"},
                "label": {"text": "WS01.CORP"}
            },
            "rel_1_AdminTo_2": {
                "id1": "1",
                "id2": "2",
                "label": {"text": "AdminTo"},
                "data": {"kind": "AdminTo"}
            },
            "rel_1_HasSession_9": {"id1": "1", "id2": "9", "data": {"kind": "HasSession"}}
        });

        let decoded = QueryResult::decode("node", value)
            .expect("valid result")
            .expect("known kind");
        let QueryResult::Node(graph) = decoded else {
            panic!("expected a node result");
        };

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node("2").map(|node| node.label.as_str()), Some("WS01.CORP"));
        assert_eq!(graph.node("1").map(|node| node.size), Some(1.5));
        assert_eq!(graph.edges()[0].kind, "AdminTo");
    }

    #[test]
    fn flat_nodes_fall_back_to_nodetype_and_font_icon() {
        let value = json!({
            "1": {"data": {"nodetype": "Computer"}},
            "2": {"data": {"kind": "Meta"}, "fontIcon": {"text": "fa-key"}},
            "3": {"data": {"kind": "User"}, "fontIcon": {"text": "fa-cloud"}}
        });
        let Ok(QueryResult::Node(graph)) = QueryResult::decode_kind(QueryKind::Node, value) else {
            panic!("expected a node result");
        };

        let computer = graph.node("1").expect("decoded");
        assert_eq!(computer.kinds, vec!["Computer"]);
        assert_eq!(computer.icon, Some(GlyphKey::Desktop));
        assert_eq!(computer.color, node_color(&computer.kinds));

        assert_eq!(graph.node("2").and_then(|node| node.icon), Some(GlyphKey::Key));
        // A kind with its own glyph wins over the producer's icon.
        assert_eq!(graph.node("3").and_then(|node| node.icon), Some(GlyphKey::User));
    }

    #[test]
    fn rel_prefixed_node_ids_stay_nodes() {
        let value = json!({
            "rel_admin": {"data": {"kind": "User"}},
            "host": {"data": {"kind": "Computer"}},
            "rel_0": {"id1": "rel_admin", "id2": "host", "width": 2.5, "data": {"kind": "AdminTo"}}
        });
        let Ok(QueryResult::Node(graph)) = QueryResult::decode_kind(QueryKind::Node, value) else {
            panic!("expected a node result");
        };

        assert!(graph.node("rel_admin").is_some());
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges()[0].source, "rel_admin");
        assert_eq!(graph.edges()[0].width, 2.5);
    }

    #[test]
    fn malformed_flat_entries_are_skipped() {
        let value = json!({
            "1": {"data": {"kind": "User"}},
            "2": "not an entry",
            "rel_x": {"id1": 7}
        });
        let decoded = QueryResult::decode_kind(QueryKind::Relationship, value).expect("object");
        assert_eq!(decoded.raw_counts(), RawCounts { nodes: 1, edges: 0 });
    }

    #[test]
    fn non_object_results_are_rejected() {
        let error = QueryResult::decode("pathfinding", json!([1, 2, 3]))
            .expect_err("arrays are not results");
        assert!(matches!(
            error,
            RawResultError::NotAnObject {
                kind: QueryKind::Pathfinding
            }
        ));
    }

    #[test]
    fn wrong_field_types_are_shape_errors() {
        let error = QueryResult::decode("composition", json!({"edges": {"not": "a list"}}))
            .expect_err("edges must be a list");
        assert!(matches!(error, RawResultError::Shape { .. }));
    }

    #[test]
    fn invalid_json_text_is_an_error() {
        assert!(matches!(
            QueryResult::decode_str("cypher", "{nodes"),
            Err(RawResultError::Json(_))
        ));
    }
}
