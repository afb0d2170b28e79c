use eframe::egui::{self, Pos2, Rect, Ui};

use crate::render::RenderParams;
use crate::render::geometry::distance_to_polyline;

use super::super::{GraphEvent, Selection, ViewModel};

/// Pointer slack around an edge centerline, in pixels.
const EDGE_HIT_SLACK_PX: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum Hit {
    Node(usize),
    Edge(usize),
}

/// Finds what sits under `pointer`: the nearest node disc wins, then the
/// nearest edge centerline within the slack. Positions and paths are world space.
pub(in crate::app) fn hit_test(
    params: &RenderParams,
    pointer: Pos2,
    nodes: &[(Pos2, f32)],
    edge_paths: &[Vec<Pos2>],
    edge_width: f32,
) -> Option<Hit> {
    let world = params.screen_to_world(pointer);

    let node = nodes
        .iter()
        .enumerate()
        .filter_map(|(index, (position, radius))| {
            let distance = position.distance(world);
            (distance <= *radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((index, _)) = node {
        return Some(Hit::Node(index));
    }

    let tolerance = (edge_width * 0.5).max(EDGE_HIT_SLACK_PX) * params.pixel();
    edge_paths
        .iter()
        .enumerate()
        .filter_map(|(index, path)| {
            let distance = distance_to_polyline(world, path);
            (distance <= tolerance).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| Hit::Edge(index))
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);

        let mut params = RenderParams::new(rect, self.pan, self.zoom);
        params.zoom_around(pointer, zoom_factor);
        self.pan = params.pan;
        self.zoom = params.zoom;
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn event_for(&self, hit: Option<Hit>) -> GraphEvent {
        let Some(cache) = &self.draw_cache else {
            return GraphEvent::BackgroundClicked;
        };

        match hit {
            Some(Hit::Node(index)) => cache
                .ids
                .get(index)
                .map(|id| GraphEvent::NodeClicked(id.clone()))
                .unwrap_or(GraphEvent::BackgroundClicked),
            Some(Hit::Edge(index)) => self
                .snapshot
                .graph
                .edges()
                .get(index)
                .map(|edge| GraphEvent::EdgeClicked(edge.key()))
                .unwrap_or(GraphEvent::BackgroundClicked),
            None => GraphEvent::BackgroundClicked,
        }
    }

    pub(in crate::app) fn apply_graph_event(&mut self, event: GraphEvent) {
        tracing::debug!(?event, "graph event");
        self.selection = match event {
            GraphEvent::NodeClicked(id) => Some(Selection::Node(id)),
            GraphEvent::EdgeClicked(key) => Some(Selection::Edge(key)),
            GraphEvent::BackgroundClicked => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn params() -> RenderParams {
        RenderParams::new(Rect::from_min_size(Pos2::ZERO, vec2(400.0, 400.0)), vec2(0.0, 0.0), 1.0)
    }

    fn screen(world: Pos2) -> Pos2 {
        params().world_to_screen(world)
    }

    #[test]
    fn nodes_win_over_edges() {
        let nodes = [(pos2(0.0, 0.0), 10.0), (pos2(100.0, 0.0), 10.0)];
        let paths = [vec![pos2(0.0, 0.0), pos2(100.0, 0.0)]];

        let hit = hit_test(&params(), screen(pos2(4.0, 0.0)), &nodes, &paths, 1.5);
        assert_eq!(hit, Some(Hit::Node(0)));
    }

    #[test]
    fn edges_hit_within_the_slack() {
        let nodes = [(pos2(0.0, 0.0), 10.0), (pos2(100.0, 0.0), 10.0)];
        let paths = [vec![pos2(0.0, 0.0), pos2(100.0, 0.0)]];

        assert_eq!(
            hit_test(&params(), screen(pos2(50.0, 3.0)), &nodes, &paths, 1.5),
            Some(Hit::Edge(0))
        );
        assert_eq!(
            hit_test(&params(), screen(pos2(50.0, 9.0)), &nodes, &paths, 1.5),
            None
        );
    }

    #[test]
    fn slack_is_measured_in_screen_pixels() {
        let viewport = Rect::from_min_size(Pos2::ZERO, vec2(400.0, 400.0));
        let zoomed_out = RenderParams::new(viewport, vec2(0.0, 0.0), 0.5);
        let paths = [vec![pos2(0.0, 0.0), pos2(100.0, 0.0)]];

        // 6 world units at zoom 0.5 is 3 pixels off the line.
        let pointer = zoomed_out.world_to_screen(pos2(50.0, 6.0));
        assert_eq!(hit_test(&zoomed_out, pointer, &[], &paths, 1.5), Some(Hit::Edge(0)));
    }

    #[test]
    fn nearest_overlapping_node_is_chosen() {
        let nodes = [(pos2(0.0, 0.0), 20.0), (pos2(10.0, 0.0), 20.0)];
        let hit = hit_test(&params(), screen(pos2(8.0, 0.0)), &nodes, &[], 1.5);
        assert_eq!(hit, Some(Hit::Node(1)));
    }
}
