use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::query::{EDGE_KEY_PREFIX, FlatEdgeEntry, FlatNodeEntry, TextLabel, WireEdge, WireNode};

use super::model::{FlatGraphResponse, GraphEdge, GraphNode};
use super::style::color_hex;

/// Writes `graph` as a flat record that decodes back as a `node` result.
pub fn write_flat_graph(path: &Path, graph: &FlatGraphResponse) -> Result<()> {
    let record = flat_record(graph)?;
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &record)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "exported graph"
    );
    Ok(())
}

/// Node entries keyed by id, relationships keyed `rel_{index}` in edge order.
pub fn flat_record(graph: &FlatGraphResponse) -> Result<Value> {
    let mut record = Map::new();
    for id in graph.sorted_node_ids() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        record.insert(id.to_owned(), serde_json::to_value(node_entry(node))?);
    }
    for (index, edge) in graph.edges().iter().enumerate() {
        let key = edge_record_key(&record, index);
        record.insert(key, serde_json::to_value(edge_entry(edge))?);
    }
    Ok(Value::Object(record))
}

/// `rel_{index}`, suffixed when a node id already took that key.
fn edge_record_key(record: &Map<String, Value>, index: usize) -> String {
    let base = format!("{EDGE_KEY_PREFIX}{index}");
    let mut key = base.clone();
    let mut suffix = 0usize;
    while record.contains_key(&key) {
        suffix += 1;
        key = format!("{base}_{suffix}");
    }
    key
}

fn node_entry(node: &GraphNode) -> FlatNodeEntry {
    FlatNodeEntry {
        color: Some(color_hex(node.color)),
        data: WireNode {
            label: node.label.clone(),
            kind: node.kinds.first().cloned().unwrap_or_default(),
            nodetype: String::new(),
            kinds: node.kinds.iter().skip(1).cloned().collect(),
            object_id: node.object_id.clone(),
            is_tier_zero: node.high_value,
            last_seen: node.last_seen.clone(),
            properties: node.properties.clone(),
        },
        font_icon: node.icon.map(|glyph| TextLabel {
            text: glyph.font_icon().to_owned(),
        }),
        label: Some(TextLabel {
            text: node.label.clone(),
        }),
        size: Some(node.size),
    }
}

fn edge_entry(edge: &GraphEdge) -> FlatEdgeEntry {
    FlatEdgeEntry {
        id1: edge.source.clone(),
        id2: edge.target.clone(),
        color: Some(color_hex(edge.color)),
        label: Some(TextLabel {
            text: edge.label.clone(),
        }),
        width: (edge.width != 1.0).then_some(edge.width),
        data: WireEdge {
            source: edge.source.clone(),
            target: edge.target.clone(),
            label: Some(edge.label.clone()),
            kind: edge.kind.clone(),
            last_seen: edge.last_seen.clone(),
            impact_percent: edge.impact_percent,
            impact_weighted: edge.impact_weighted,
            data: edge.properties.clone(),
        },
    }
}
