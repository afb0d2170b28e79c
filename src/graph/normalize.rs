use eframe::egui::Color32;
use serde_json::Value;

use crate::query::{GraphData, QueryResult, WireEdge, WireNode};

use super::model::{FlatGraphResponse, GraphEdge, GraphNode};
use super::style::{
    TIER_ZERO_TAG, edge_color, edge_label, glyph_for_font_icon, impact_color, impact_width,
    node_color, node_glyph,
};

/// Property carrying composite risk when the edge has no top-level impact.
const IMPACT_PROPERTY: &str = "composite_risk_impact_percent";
const SYSTEM_TAGS_PROPERTY: &str = "system_tags";

/// Converts any raw query result into the render-ready flat graph.
///
/// Never fails: a missing result or one with nothing usable yields an empty
/// graph. Applying it to its own output returns the same graph.
pub fn normalize(raw: Option<&QueryResult>) -> FlatGraphResponse {
    let Some(raw) = raw else {
        return FlatGraphResponse::empty();
    };

    let graph = match raw {
        QueryResult::Node(graph) | QueryResult::Relationship(graph) => graph.clone(),
        QueryResult::Cypher(data) => flatten(data),
        QueryResult::Composition(data) => {
            let mut graph = flatten(data);
            weigh_by_impact(graph.edges_mut());
            graph
        }
        QueryResult::Pathfinding(data) => {
            let mut graph = flatten(data);
            // Steps count surviving edges only, so dropped ones leave no gaps.
            for (step, edge) in graph.edges_mut().iter_mut().enumerate() {
                edge.path_step = Some(step);
            }
            graph
        }
    };

    tracing::debug!(
        kind = %raw.kind(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "normalized query result"
    );
    graph
}

fn flatten(data: &GraphData) -> FlatGraphResponse {
    let nodes = data
        .nodes
        .iter()
        .map(|(id, wire)| node_from_wire(id, wire, None, None, None));
    let edges = data.edges.iter().map(|wire| {
        edge_from_wire(
            wire,
            wire.source.clone(),
            wire.target.clone(),
            None,
            None,
        )
    });
    FlatGraphResponse::new(nodes, edges)
}

/// Log-scaled composite impact of one edge.
fn impact_score(percent: f64) -> f64 {
    (percent * 100.0).round().log10().max(0.0)
}

/// Colors and widens edges by composite impact, relative to the range of
/// impacts in the same result. Edges without an impact keep their style.
fn weigh_by_impact(edges: &mut [GraphEdge]) {
    for edge in edges.iter_mut() {
        if edge.impact_percent.is_none() {
            edge.impact_percent = edge.properties.get(IMPACT_PROPERTY).and_then(Value::as_f64);
        }
    }

    let scores = edges
        .iter()
        .filter_map(|edge| edge.impact_percent)
        .map(impact_score)
        .collect::<Vec<_>>();
    let Some(low) = scores.iter().copied().reduce(f64::min) else {
        return;
    };
    let high = scores.iter().copied().fold(low, f64::max);

    for edge in edges.iter_mut() {
        let Some(percent) = edge.impact_percent else {
            continue;
        };
        let weight = if high - low > f64::EPSILON {
            ((impact_score(percent) - low) / (high - low)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        edge.color = impact_color(weight as f32);
        edge.width = impact_width(weight as f32);
        edge.impact_weighted = Some(weight * 100.0);
    }
}

/// Builds a node from its wire form. `size`, `color` and `font_icon` come from
/// flat records that were already styled by the producer.
pub(crate) fn node_from_wire(
    id: &str,
    wire: &WireNode,
    size: Option<f32>,
    color: Option<Color32>,
    font_icon: Option<&str>,
) -> GraphNode {
    let primary = if wire.kind.trim().is_empty() {
        &wire.nodetype
    } else {
        &wire.kind
    };
    let mut kinds = Vec::with_capacity(wire.kinds.len() + 1);
    for kind in std::iter::once(primary).chain(&wire.kinds) {
        let kind = kind.trim();
        if !kind.is_empty() && !kinds.iter().any(|known: &String| known == kind) {
            kinds.push(kind.to_owned());
        }
    }

    let property = |key: &str| wire.properties.get(key).and_then(Value::as_str);
    let label = [Some(wire.label.as_str()), property("name"), wire.object_id.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|label| !label.is_empty())
        .unwrap_or(id)
        .to_owned();
    let high_value = wire.is_tier_zero
        || property(SYSTEM_TAGS_PROPERTY)
            .is_some_and(|tags| tags.split_whitespace().any(|tag| tag == TIER_ZERO_TAG));

    GraphNode {
        id: id.to_owned(),
        label,
        size: size.filter(|size| size.is_finite() && *size > 0.0).unwrap_or(1.0),
        color: color.unwrap_or_else(|| node_color(&kinds)),
        icon: node_glyph(&kinds).or_else(|| font_icon.and_then(glyph_for_font_icon)),
        high_value,
        object_id: wire
            .object_id
            .clone()
            .or_else(|| property("objectid").map(str::to_owned)),
        last_seen: wire.last_seen.clone(),
        properties: wire.properties.clone(),
        kinds,
    }
}

pub(crate) fn edge_from_wire(
    wire: &WireEdge,
    source: String,
    target: String,
    label: Option<&str>,
    color: Option<Color32>,
) -> GraphEdge {
    let kind = wire.kind.trim().to_owned();
    GraphEdge {
        label: edge_label(&kind, label.or(wire.label.as_deref())),
        color: color.unwrap_or_else(|| edge_color(&kind)),
        source,
        target,
        last_seen: wire.last_seen.clone(),
        impact_percent: wire.impact_percent,
        impact_weighted: wire.impact_weighted,
        width: 1.0,
        path_step: None,
        properties: wire.data.clone(),
        kind,
    }
}
