use std::sync::Arc;

use crate::query::{QueryKind, QueryResult, RawCounts};

use super::limit::{Truncation, enforce_limit};
use super::model::FlatGraphResponse;
use super::normalize::normalize;

/// Identifies one query run. Later tickets supersede earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryTicket(u64);

/// Immutable view of one query's render-ready graph.
#[derive(Debug)]
pub struct GraphSnapshot {
    pub sequence: u64,
    pub kind: Option<QueryKind>,
    pub graph: Arc<FlatGraphResponse>,
    pub truncation: Option<Truncation>,
    pub raw: RawCounts,
}

impl GraphSnapshot {
    pub fn empty() -> Self {
        Self {
            sequence: 0,
            kind: None,
            graph: Arc::new(FlatGraphResponse::empty()),
            truncation: None,
            raw: RawCounts::default(),
        }
    }

    /// Message shown instead of the graph when there is nothing to draw.
    pub fn notice(&self) -> Option<&'static str> {
        let kind = self.kind?;
        if !self.graph.is_empty() {
            return None;
        }
        Some(match kind {
            QueryKind::Cypher if self.raw.nodes == 0 && self.raw.edges > 0 => {
                "Results are not rendered since only edges were returned."
            }
            QueryKind::Pathfinding => "Path not found.",
            _ => "No results match your criteria.",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Published,
    /// A newer query was started after this one; its result was discarded.
    Superseded,
}

struct Memo {
    raw: Arc<QueryResult>,
    kind: QueryKind,
    graph: Arc<FlatGraphResponse>,
    truncation: Option<Truncation>,
}

/// Turns raw query results into published snapshots.
///
/// Normalization and the render limit run once per distinct raw result; the
/// camera never enters here, so panning and zooming reuse the same graph.
pub struct SnapshotPipeline {
    next_ticket: u64,
    latest_started: Option<QueryTicket>,
    latest_published: Option<QueryTicket>,
    current: Arc<GraphSnapshot>,
    memo: Option<Memo>,
    normalize_runs: usize,
}

impl Default for SnapshotPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPipeline {
    pub fn new() -> Self {
        Self {
            next_ticket: 1,
            latest_started: None,
            latest_published: None,
            current: Arc::new(GraphSnapshot::empty()),
            memo: None,
            normalize_runs: 0,
        }
    }

    pub fn begin(&mut self) -> QueryTicket {
        let ticket = QueryTicket(self.next_ticket);
        self.next_ticket += 1;
        self.latest_started = Some(ticket);
        ticket
    }

    pub fn is_pending(&self) -> bool {
        self.latest_started.is_some() && self.latest_started != self.latest_published
    }

    /// Whether a query newer than `ticket` has started.
    pub fn is_superseded(&self, ticket: QueryTicket) -> bool {
        self.latest_started.is_some_and(|latest| ticket < latest)
    }

    pub fn current(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&self.current)
    }

    /// Publishes the result of `ticket` unless a newer query has started.
    pub fn complete(
        &mut self,
        ticket: QueryTicket,
        raw: Option<Arc<QueryResult>>,
    ) -> Completion {
        if self.is_superseded(ticket) {
            tracing::debug!(ticket = ticket.0, "discarded superseded query result");
            return Completion::Superseded;
        }

        let (kind, graph, truncation, counts) = match raw {
            Some(raw) => {
                let (graph, truncation) = self.limited(&raw);
                (Some(raw.kind()), graph, truncation, raw.raw_counts())
            }
            None => (
                None,
                Arc::new(FlatGraphResponse::empty()),
                None,
                RawCounts::default(),
            ),
        };

        self.current = Arc::new(GraphSnapshot {
            sequence: ticket.0,
            kind,
            graph,
            truncation,
            raw: counts,
        });
        self.latest_published = Some(ticket);
        tracing::info!(
            sequence = ticket.0,
            nodes = self.current.graph.node_count(),
            edges = self.current.graph.edge_count(),
            "published graph snapshot"
        );
        Completion::Published
    }

    fn limited(
        &mut self,
        raw: &Arc<QueryResult>,
    ) -> (Arc<FlatGraphResponse>, Option<Truncation>) {
        if let Some(memo) = &self.memo
            && memo.kind == raw.kind()
            && Arc::ptr_eq(&memo.raw, raw)
        {
            tracing::debug!("reused memoized graph");
            return (Arc::clone(&memo.graph), memo.truncation);
        }

        self.normalize_runs += 1;
        let (graph, truncation) = enforce_limit(normalize(Some(raw.as_ref()))).into_parts();
        let graph = Arc::new(graph);
        self.memo = Some(Memo {
            raw: Arc::clone(raw),
            kind: raw.kind(),
            graph: Arc::clone(&graph),
            truncation,
        });
        (graph, truncation)
    }

    /// How often normalization actually ran.
    pub fn normalize_runs(&self) -> usize {
        self.normalize_runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::GraphData;

    fn cypher(ids: &[&str]) -> Arc<QueryResult> {
        let mut data = GraphData::default();
        for id in ids {
            data.nodes.insert(id.to_string(), Default::default());
        }
        Arc::new(QueryResult::Cypher(data))
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut pipeline = SnapshotPipeline::new();
        let first = pipeline.begin();
        let second = pipeline.begin();

        assert_eq!(pipeline.complete(second, Some(cypher(&["B"]))), Completion::Published);
        assert_eq!(pipeline.complete(first, Some(cypher(&["A"]))), Completion::Superseded);

        let current = pipeline.current();
        assert!(current.graph.node("B").is_some());
        assert!(current.graph.node("A").is_none());
        assert!(!pipeline.is_pending());
        assert!(pipeline.is_superseded(first));
        assert!(!pipeline.is_superseded(second));
    }

    #[test]
    fn pending_until_the_latest_query_lands() {
        let mut pipeline = SnapshotPipeline::new();
        assert!(!pipeline.is_pending());

        let ticket = pipeline.begin();
        assert!(pipeline.is_pending());
        assert!(pipeline.current().graph.is_empty());

        pipeline.complete(ticket, None);
        assert!(!pipeline.is_pending());
    }

    #[test]
    fn same_raw_result_is_normalized_once() {
        let mut pipeline = SnapshotPipeline::new();
        let raw = cypher(&["A", "B"]);

        let first = pipeline.begin();
        pipeline.complete(first, Some(Arc::clone(&raw)));
        let before = pipeline.current();

        let second = pipeline.begin();
        pipeline.complete(second, Some(Arc::clone(&raw)));
        let after = pipeline.current();

        assert_eq!(pipeline.normalize_runs(), 1);
        assert!(Arc::ptr_eq(&before.graph, &after.graph));
        assert!(after.sequence > before.sequence);
    }

    #[test]
    fn equal_but_distinct_results_are_normalized_again() {
        let mut pipeline = SnapshotPipeline::new();
        let first = pipeline.begin();
        pipeline.complete(first, Some(cypher(&["A"])));
        let second = pipeline.begin();
        pipeline.complete(second, Some(cypher(&["A"])));

        assert_eq!(pipeline.normalize_runs(), 2);
    }

    #[test]
    fn notices_explain_empty_graphs() {
        let mut snapshot = GraphSnapshot::empty();
        assert_eq!(snapshot.notice(), None);

        snapshot.kind = Some(QueryKind::Pathfinding);
        assert_eq!(snapshot.notice(), Some("Path not found."));

        snapshot.kind = Some(QueryKind::Cypher);
        snapshot.raw = RawCounts { nodes: 0, edges: 3 };
        assert_eq!(
            snapshot.notice(),
            Some("Results are not rendered since only edges were returned.")
        );

        snapshot.kind = Some(QueryKind::Node);
        assert_eq!(snapshot.notice(), Some("No results match your criteria."));
    }
}
