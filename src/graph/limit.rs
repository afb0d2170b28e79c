use std::collections::{HashMap, HashSet};

use super::model::{FlatGraphResponse, GraphNode};

/// Most nodes a single snapshot will ever render.
pub const RENDER_LIMIT: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Truncation {
    pub shown: usize,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LimitOutcome {
    Within(FlatGraphResponse),
    Truncated {
        graph: FlatGraphResponse,
        signal: Truncation,
    },
}

impl LimitOutcome {
    #[cfg(test)]
    pub fn graph(&self) -> &FlatGraphResponse {
        match self {
            Self::Within(graph) | Self::Truncated { graph, .. } => graph,
        }
    }

    #[cfg(test)]
    pub fn truncation(&self) -> Option<Truncation> {
        match self {
            Self::Within(_) => None,
            Self::Truncated { signal, .. } => Some(*signal),
        }
    }

    pub fn into_parts(self) -> (FlatGraphResponse, Option<Truncation>) {
        match self {
            Self::Within(graph) => (graph, None),
            Self::Truncated { graph, signal } => (graph, Some(signal)),
        }
    }
}

pub fn enforce_limit(graph: FlatGraphResponse) -> LimitOutcome {
    enforce_limit_with(graph, RENDER_LIMIT)
}

/// Keeps at most `limit` nodes: high-value nodes first, then the best
/// connected, then by id. Edges touching a dropped node go with it.
pub fn enforce_limit_with(graph: FlatGraphResponse, limit: usize) -> LimitOutcome {
    let total = graph.node_count();
    if total <= limit {
        return LimitOutcome::Within(graph);
    }

    let mut degree = HashMap::<&str, usize>::with_capacity(total);
    for edge in graph.edges() {
        *degree.entry(edge.source.as_str()).or_default() += 1;
        *degree.entry(edge.target.as_str()).or_default() += 1;
    }

    let degree_of = |node: &GraphNode| degree.get(node.id.as_str()).copied().unwrap_or(0);
    let mut ranked = graph.nodes().values().collect::<Vec<_>>();
    ranked.sort_by(|a, b| {
        b.high_value
            .cmp(&a.high_value)
            .then_with(|| degree_of(b).cmp(&degree_of(a)))
            .then_with(|| a.id.cmp(&b.id))
    });
    let kept = ranked
        .into_iter()
        .take(limit)
        .map(|node| node.id.clone())
        .collect::<HashSet<_>>();

    let (nodes, edges) = graph.into_parts();
    let graph = FlatGraphResponse::new(
        nodes.into_values().filter(|node| kept.contains(&node.id)),
        edges
            .into_iter()
            .filter(|edge| kept.contains(&edge.source) && kept.contains(&edge.target)),
    );

    tracing::info!(shown = graph.node_count(), total, "render limit truncated the graph");
    LimitOutcome::Truncated {
        signal: Truncation {
            shown: graph.node_count(),
            total,
        },
        graph,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::graph::fixtures::{edge, node};

    fn chain(count: usize) -> FlatGraphResponse {
        let ids = (0..count).map(|index| format!("n{index:05}")).collect::<Vec<_>>();
        FlatGraphResponse::new(
            ids.iter().map(|id| node(id)),
            ids.windows(2).map(|pair| edge(&pair[0], &pair[1], "MemberOf")),
        )
    }

    #[test]
    fn small_graphs_pass_untouched() {
        let graph = chain(10);
        assert_eq!(enforce_limit(graph.clone()), LimitOutcome::Within(graph));
    }

    #[test]
    fn exactly_the_limit_is_within() {
        let outcome = enforce_limit(chain(RENDER_LIMIT));
        assert!(outcome.truncation().is_none());
    }

    #[test]
    fn large_path_result_is_cut_to_the_limit() {
        let outcome = enforce_limit(chain(1500));
        let truncation = outcome.truncation().expect("over the limit");

        assert_eq!(truncation, Truncation { shown: 1000, total: 1500 });
        let graph = outcome.graph();
        assert_eq!(graph.node_count(), RENDER_LIMIT);
        for edge in graph.edges() {
            assert!(graph.node(&edge.source).is_some());
            assert!(graph.node(&edge.target).is_some());
        }
    }

    #[test]
    fn high_value_and_hubs_survive() {
        let mut nodes = (0..5).map(|index| node(&format!("leaf{index}"))).collect::<Vec<_>>();
        let mut tier_zero = node("zz-domain-admins");
        tier_zero.high_value = true;
        nodes.push(tier_zero);
        nodes.push(node("zz-hub"));
        let edges = (0..3).map(|index| edge(&format!("leaf{index}"), "zz-hub", "MemberOf"));

        let outcome = enforce_limit_with(FlatGraphResponse::new(nodes, edges), 2);
        let graph = outcome.graph();

        assert!(graph.node("zz-domain-admins").is_some());
        assert!(graph.node("zz-hub").is_some());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn selection_is_deterministic() {
        let first = enforce_limit_with(chain(50), 20);
        let second = enforce_limit_with(chain(50), 20);
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn never_exceeds_the_limit(count in 0usize..80, limit in 1usize..40) {
            let outcome = enforce_limit_with(chain(count), limit);
            let graph = outcome.graph();

            prop_assert_eq!(graph.node_count(), count.min(limit));
            prop_assert_eq!(outcome.truncation().is_some(), count > limit);
            for edge in graph.edges() {
                prop_assert!(graph.node(&edge.source).is_some());
                prop_assert!(graph.node(&edge.target).is_some());
            }
        }
    }
}
