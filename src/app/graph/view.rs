use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::epaint::Mesh;
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Shape, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::GraphNode;
use crate::render::RenderParams;
use crate::render::geometry::{node_radius, polyline_midpoint};
use crate::render::programs::{ARROW_MIN_PX, ARROW_SCALE, EdgeDisplay, NodeDisplay, NodeState};

use super::super::render_utils::{circle_visible, draw_background, edge_visible};
use super::super::{SearchMatchCache, Selection, ViewModel};
use super::interaction::{Hit, hit_test};

const SELECTED_EDGE_COLOR: Color32 = Color32::from_rgb(246, 206, 104);
const DIMMED_EDGE_FADE: f32 = 0.22;
const LABEL_MIN_RADIUS_PX: f32 = 14.0;
const LABEL_ZOOM: f32 = 1.35;
const SELECTED_EDGE_SCALE: f32 = 1.8;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Node indices matching `query`, best first.
pub(in crate::app) fn rank_matches(
    ids: &[String],
    nodes: &[&GraphNode],
    query: &str,
) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let by_label = fuzzy_match_score(&matcher, &node.label, query);
            let by_id = ids
                .get(index)
                .and_then(|id| fuzzy_match_score(&matcher, id, query));
            by_label.max(by_id).map(|score| (score, index))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, index)| index).collect()
}

/// On-screen width of an edge: the viewer's base width scaled by the edge's own
/// weight, widened further while selected.
pub(in crate::app) fn edge_display_width(base: f32, weight: f32, selected: bool) -> f32 {
    let weight = if weight.is_finite() && weight > 0.0 { weight } else { 1.0 };
    let width = base * weight;
    if selected { width * SELECTED_EDGE_SCALE } else { width }
}

impl ViewModel {
    /// Search hits for the current query, cached per snapshot.
    pub(in crate::app) fn search_matches(&mut self) -> Option<Arc<Vec<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }
        let cache = self.draw_cache.as_ref()?;

        if let Some(cached) = &self.search_match_cache
            && cached.sequence == cache.sequence
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let graph = &self.snapshot.graph;
        let nodes = cache
            .ids
            .iter()
            .filter_map(|id| graph.node(id))
            .collect::<Vec<_>>();
        let matches = Arc::new(rank_matches(&cache.ids, &nodes, query));

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            sequence: cache.sequence,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        self.ensure_draw_cache();

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.fit_pending {
            self.fit_to(rect);
        }
        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        if let Some(notice) = self.snapshot.notice() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                notice,
                FontId::proportional(16.0),
                Color32::from_gray(200),
            );
        }

        let search_hits = self
            .search_matches()
            .map(|matches| matches.iter().copied().collect::<HashSet<_>>());
        let Some(mut cache) = self.draw_cache.take() else {
            return;
        };

        let params = RenderParams::new(rect, self.pan, self.zoom);
        let zoom = params.zoom;
        let graph = Arc::clone(&self.snapshot.graph);
        let nodes = cache
            .ids
            .iter()
            .filter_map(|id| graph.node(id))
            .collect::<Vec<_>>();

        let selected_node = match &self.selection {
            Some(Selection::Node(id)) => cache.index_by_id.get(id).copied(),
            _ => None,
        };
        let selected_edge = match &self.selection {
            Some(Selection::Edge(key)) => graph.edges().iter().position(|edge| edge.has_key(key)),
            _ => None,
        };
        let is_search_hit =
            |index: usize| search_hits.as_ref().is_some_and(|hits| hits.contains(&index));
        let dimmed = |index: usize| match (selected_node, &search_hits) {
            (Some(focus), _) => index != focus && !cache.neighbors[focus].contains(&index),
            (None, Some(hits)) => !hits.contains(&index),
            (None, None) => false,
        };

        let displays = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| NodeDisplay {
                position: self.positions.get(&node.id).copied().unwrap_or(Pos2::ZERO),
                radius: node_radius(
                    node.size,
                    zoom,
                    selected_node == Some(index) || is_search_hit(index),
                ),
            })
            .collect::<Vec<_>>();

        let hovered = ui.input(|input| input.pointer.hover_pos()).and_then(|pointer| {
            if !rect.contains(pointer) {
                return None;
            }
            let discs = displays
                .iter()
                .map(|display| (display.position, display.radius))
                .collect::<Vec<_>>();
            hit_test(&params, pointer, &discs, &cache.edge_paths, self.edge_width)
        });
        let hovered_node = match hovered {
            Some(Hit::Node(index)) => Some(index),
            _ => None,
        };

        let feather = params.feather();
        let mut edge_mesh = Mesh::default();
        let mut edge_labels = Vec::new();
        let mut visible_edges = 0usize;
        for (index, edge) in graph.edges().iter().enumerate() {
            let Some(&(source, target)) = cache.endpoints.get(index) else {
                continue;
            };
            let (Some(&from), Some(&to)) = (displays.get(source), displays.get(target)) else {
                continue;
            };
            let slot = cache.slots[index];
            let selected = selected_edge == Some(index);
            let width = edge_display_width(self.edge_width, edge.width, selected);

            let start = params.world_to_screen(from.position);
            let end = params.world_to_screen(to.position);
            let bulge = (end - start).length() * slot.height().abs() * 0.5;
            // Self-loops grow with the arrowhead, so the margin does too.
            let arrow = (width * ARROW_SCALE).max(ARROW_MIN_PX);
            let reach = from.radius.max(to.radius) * zoom * 4.0 + bulge + arrow * 2.0 + 2.5;
            if !edge_visible(rect.expand(reach), start, end, 0.0) {
                cache.edge_paths[index].clear();
                continue;
            }

            let faded = selected_node.is_some_and(|focus| source != focus && target != focus)
                || (selected_node.is_none() && search_hits.is_some())
                || selected_edge.is_some_and(|chosen| chosen != index);
            let color = if selected {
                SELECTED_EDGE_COLOR
            } else if faded {
                edge.color.gamma_multiply(DIMMED_EDGE_FADE)
            } else {
                edge.color
            };
            let display = EdgeDisplay {
                color,
                width,
                zoom,
                feather,
                slot,
            };

            let path = self.edge_program.process(from, to, &display, &mut edge_mesh);
            cache.edge_paths[index].clear();
            cache.edge_paths[index].extend_from_slice(path.samples());
            visible_edges += 1;

            if (self.show_edge_labels && !faded) || selected {
                edge_labels.push((index, if selected { SELECTED_EDGE_COLOR } else { color }));
            }
        }
        params.apply(&mut edge_mesh);
        painter.add(Shape::mesh(edge_mesh));

        let mut draw_order = (0..nodes.len())
            .filter(|&index| {
                let display = &displays[index];
                circle_visible(
                    rect,
                    params.world_to_screen(display.position),
                    display.radius * zoom * 1.5,
                )
            })
            .collect::<Vec<_>>();
        draw_order.sort_by_key(|&index| {
            (
                selected_node == Some(index),
                hovered_node == Some(index),
                !dimmed(index),
            )
        });

        let mut node_mesh = self.node_program.begin();
        for &index in &draw_order {
            let state = NodeState {
                selected: selected_node == Some(index),
                hovered: hovered_node == Some(index),
                dimmed: dimmed(index),
            };
            self.node_program
                .process(nodes[index], &displays[index], state, &mut node_mesh);
        }
        params.apply(&mut node_mesh);
        painter.add(Shape::mesh(node_mesh));

        if self.show_node_labels {
            for &index in &draw_order {
                let radius = displays[index].radius * zoom;
                let emphasized = selected_node == Some(index)
                    || hovered_node == Some(index)
                    || is_search_hit(index);
                let roomy = radius > LABEL_MIN_RADIUS_PX || zoom > LABEL_ZOOM;
                if !emphasized && (dimmed(index) || !roomy) {
                    continue;
                }
                painter.text(
                    params.world_to_screen(displays[index].position) + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    &nodes[index].label,
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        for (index, color) in edge_labels {
            let Some(edge) = graph.edges().get(index) else {
                continue;
            };
            let Some(middle) = cache.edge_paths.get(index).and_then(|path| polyline_midpoint(path))
            else {
                continue;
            };
            painter.text(
                params.world_to_screen(middle) + vec2(0.0, -4.0),
                Align2::CENTER_BOTTOM,
                &edge.label,
                FontId::proportional(11.0),
                color,
            );
        }

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if let Some(index) = hovered_node
            && let Some(node) = nodes.get(index)
        {
            let panel_text = format!(
                "{}  |  {}  |  links {}",
                node.label,
                node.primary_kind(),
                cache.neighbors[index].len()
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        self.visible_node_count = draw_order.len();
        self.visible_edge_count = visible_edges;
        self.draw_cache = Some(cache);

        if response.clicked_by(egui::PointerButton::Primary) {
            let event = self.event_for(hovered);
            self.apply_graph_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::node;

    #[test]
    fn search_ranks_by_label_and_id() {
        let mut alice = node("S-1-5-21-1104");
        alice.label = "ALICE@CORP.LOCAL".to_owned();
        let mut bob = node("S-1-5-21-1105");
        bob.label = "BOB@CORP.LOCAL".to_owned();
        let ids = vec![alice.id.clone(), bob.id.clone()];

        assert_eq!(rank_matches(&ids, &[&alice, &bob], "alice"), vec![0]);
        assert_eq!(rank_matches(&ids, &[&alice, &bob], "1105"), vec![1]);
        assert!(rank_matches(&ids, &[&alice, &bob], "   ").is_empty());
    }

    #[test]
    fn edge_width_follows_the_edge_weight() {
        assert_eq!(edge_display_width(1.5, 1.0, false), 1.5);
        assert_eq!(edge_display_width(1.5, 4.0, false), 6.0);
        assert_eq!(edge_display_width(2.0, 2.0, true), 2.0 * 2.0 * SELECTED_EDGE_SCALE);
        assert_eq!(edge_display_width(1.5, f32::NAN, false), 1.5);
    }
}
