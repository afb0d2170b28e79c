use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui::{Rect, TextureHandle, Vec2};

use crate::graph::{FlatGraphResponse, GraphSnapshot};
use crate::layout::force_layout;
use crate::render::GlyphAtlas;
use crate::render::camera::{MAX_ZOOM, MIN_ZOOM};
use crate::render::geometry::NODE_BASE_RADIUS;
use crate::render::programs::{CompoundEdgeProgram, GlyphNodeProgram, parallel_slots};

use super::super::{DrawCache, ExplorerConfig, Selection, ViewModel};

const FIT_MARGIN: f32 = 0.88;

impl DrawCache {
    pub(in crate::app) fn build(graph: &FlatGraphResponse, sequence: u64) -> Self {
        let ids = graph
            .sorted_node_ids()
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let index_by_id = ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut endpoints = Vec::with_capacity(graph.edge_count());
        let mut neighbors = vec![Vec::new(); ids.len()];
        for edge in graph.edges() {
            // The graph guarantees both endpoints exist.
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
            else {
                continue;
            };
            endpoints.push((source, target));
            if source != target {
                neighbors[source].push(target);
                neighbors[target].push(source);
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            sequence,
            slots: parallel_slots(graph.edges()),
            edge_paths: vec![Vec::new(); endpoints.len()],
            ids,
            index_by_id,
            endpoints,
            neighbors,
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn new(
        config: &ExplorerConfig,
        atlas: Arc<GlyphAtlas>,
        texture: TextureHandle,
    ) -> Self {
        Self {
            snapshot: Arc::new(GraphSnapshot::empty()),
            node_program: GlyphNodeProgram::new(atlas, texture.id()),
            edge_program: CompoundEdgeProgram::standard(),
            _atlas_texture: texture,
            positions: HashMap::new(),
            draw_cache: None,
            fit_pending: false,
            pan: Vec2::ZERO,
            zoom: 1.0,
            selection: None,
            search: String::new(),
            search_match_cache: None,
            input_path: config
                .input
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            kind_tag: config.kind_tag.clone(),
            export_path: "secgraph-export.json".to_owned(),
            export_status: None,
            edge_width: config.edge_width,
            layout_iterations: config.layout_iterations,
            show_node_labels: true,
            show_edge_labels: false,
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    /// Swaps in the latest published snapshot. Selections that no longer exist are cleared.
    pub(in crate::app) fn set_snapshot(&mut self, snapshot: Arc<GraphSnapshot>) {
        if Arc::ptr_eq(&self.snapshot, &snapshot) {
            return;
        }

        let graph = &snapshot.graph;
        let still_valid = match &self.selection {
            Some(Selection::Node(id)) => graph.node(id).is_some(),
            Some(Selection::Edge(key)) => graph.edge(key).is_some(),
            None => true,
        };
        if !still_valid {
            self.selection = None;
        }

        self.snapshot = snapshot;
        self.draw_cache = None;
    }

    pub(in crate::app) fn ensure_draw_cache(&mut self) {
        let sequence = self.snapshot.sequence;
        if self
            .draw_cache
            .as_ref()
            .is_some_and(|cache| cache.sequence == sequence)
        {
            return;
        }

        let cache = DrawCache::build(&self.snapshot.graph, sequence);
        self.place_nodes(&cache);
        self.draw_cache = Some(cache);
    }

    /// Lays the graph out again unless every node already has a position.
    fn place_nodes(&mut self, cache: &DrawCache) {
        if cache.ids.iter().all(|id| self.positions.contains_key(id)) {
            return;
        }

        let radii = cache
            .ids
            .iter()
            .map(|id| {
                let size = self.snapshot.graph.node(id).map_or(1.0, |node| node.size);
                NODE_BASE_RADIUS * size
            })
            .collect::<Vec<_>>();
        let laid_out = force_layout(&cache.ids, &cache.endpoints, &radii, self.layout_iterations);

        self.positions = cache
            .ids
            .iter()
            .cloned()
            .zip(laid_out.into_iter().map(Vec2::to_pos2))
            .collect();
        self.fit_pending = true;
        tracing::debug!(nodes = cache.ids.len(), "laid out graph");
    }

    pub(in crate::app) fn fit_to(&mut self, rect: Rect) {
        let bounds = Rect::from_points(&self.positions.values().copied().collect::<Vec<_>>());
        if let Some((pan, zoom)) = fit_transform(rect, bounds) {
            self.pan = pan;
            self.zoom = zoom;
        }
        self.fit_pending = false;
    }
}

/// Pan and zoom that frame `bounds` (world space) inside `rect`.
fn fit_transform(rect: Rect, bounds: Rect) -> Option<(Vec2, f32)> {
    if !bounds.is_finite() || bounds.is_negative() {
        return None;
    }

    let size = bounds.size().max(Vec2::splat(NODE_BASE_RADIUS * 4.0));
    let zoom = ((rect.width() / size.x).min(rect.height() / size.y) * FIT_MARGIN)
        .clamp(MIN_ZOOM, MAX_ZOOM);
    Some((-bounds.center().to_vec2() * zoom, zoom))
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Pos2, pos2, vec2};

    use super::*;
    use crate::graph::fixtures::{edge, node};

    #[test]
    fn cache_indexes_nodes_in_id_order() {
        let graph = FlatGraphResponse::new(
            [node("c"), node("a"), node("b")],
            [edge("c", "a", "X"), edge("a", "c", "Y"), edge("b", "b", "Z")],
        );
        let cache = DrawCache::build(&graph, 7);

        assert_eq!(cache.ids, vec!["a", "b", "c"]);
        assert_eq!(cache.endpoints, vec![(2, 0), (0, 2), (1, 1)]);
        assert_eq!(cache.neighbors[0], vec![2]);
        assert!(cache.neighbors[1].is_empty());
        assert_eq!(cache.slots[0].group_size, 2);
        assert!(cache.slots[2].self_loop);
        assert_eq!(cache.edge_paths.len(), 3);
    }

    #[test]
    fn fit_centres_the_bounds() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
        let bounds = Rect::from_min_max(pos2(100.0, 100.0), pos2(500.0, 300.0));
        let (pan, zoom) = fit_transform(rect, bounds).expect("finite bounds");

        assert!((zoom - 1.76).abs() < 1e-4);
        let centre_on_screen = rect.center() + pan + bounds.center().to_vec2() * zoom;
        assert!((centre_on_screen - rect.center()).length() < 1e-3);
    }

    #[test]
    fn empty_bounds_leave_the_camera_alone() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
        assert_eq!(fit_transform(rect, Rect::NOTHING), None);
    }
}
