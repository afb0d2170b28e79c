use std::sync::Arc;

use eframe::egui::epaint::{Mesh, TextureId};
use eframe::egui::{Color32, Pos2, Rect, Vec2};

use crate::graph::GraphNode;
use crate::graph::style::HIGH_VALUE_BORDER;
use crate::render::atlas::GlyphAtlas;

use super::NodeDisplay;

const BORDER_RATIO: f32 = 0.14;
const GLYPH_SCALE: f32 = 0.58;
const HALO_SCALE: f32 = 1.45;

const BORDER_SHADE: f32 = 0.55;
const GLYPH_COLOR: Color32 = Color32::from_rgb(0x1C, 0x1F, 0x24);
const SELECTED_HALO: Color32 = Color32::from_rgba_premultiplied(0x7A, 0x66, 0x2E, 0x80);
const HOVERED_HALO: Color32 = Color32::from_rgba_premultiplied(0x50, 0x58, 0x62, 0x60);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeState {
    pub selected: bool,
    pub hovered: bool,
    /// Another node is focused and this one is not related to it.
    pub dimmed: bool,
}

/// Draws nodes as textured quads sampled from the shared glyph atlas: halo,
/// border disc, body disc and kind glyph, all in one texture.
pub struct GlyphNodeProgram {
    atlas: Arc<GlyphAtlas>,
    texture: TextureId,
}

impl GlyphNodeProgram {
    pub fn new(atlas: Arc<GlyphAtlas>, texture: TextureId) -> Self {
        Self { atlas, texture }
    }

    /// Empty mesh bound to the atlas texture.
    pub fn begin(&self) -> Mesh {
        Mesh::with_texture(self.texture)
    }

    pub fn process(
        &self,
        node: &GraphNode,
        display: &NodeDisplay,
        state: NodeState,
        mesh: &mut Mesh,
    ) {
        let centre = display.position;
        let radius = display.radius;
        let disc = self.atlas.disc_uv();
        let fade = if state.dimmed { 0.3 } else { 1.0 };

        if state.selected {
            push_quad(mesh, centre, radius * HALO_SCALE, disc, SELECTED_HALO);
        } else if state.hovered {
            push_quad(mesh, centre, radius * HALO_SCALE, disc, HOVERED_HALO);
        }

        let border = if node.high_value {
            HIGH_VALUE_BORDER
        } else {
            darken(node.color)
        };
        push_quad(mesh, centre, radius, disc, border.gamma_multiply(fade));
        push_quad(
            mesh,
            centre,
            radius * (1.0 - BORDER_RATIO),
            disc,
            node.color.gamma_multiply(fade),
        );
        push_quad(
            mesh,
            centre,
            radius * GLYPH_SCALE,
            self.atlas.glyph_uv(node.icon),
            GLYPH_COLOR.gamma_multiply(fade),
        );
    }
}

fn darken(color: Color32) -> Color32 {
    let shade = |channel: u8| (channel as f32 * BORDER_SHADE) as u8;
    Color32::from_rgb(shade(color.r()), shade(color.g()), shade(color.b()))
}

fn push_quad(mesh: &mut Mesh, centre: Pos2, radius: f32, uv: Rect, color: Color32) {
    let rect = Rect::from_center_size(centre, Vec2::splat(radius * 2.0));
    mesh.add_rect_with_uv(rect, uv, color);
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::graph::fixtures::node;
    use crate::graph::style::GlyphKey;

    fn program() -> GlyphNodeProgram {
        GlyphNodeProgram::new(Arc::new(GlyphAtlas::build()), TextureId::default())
    }

    fn display() -> NodeDisplay {
        NodeDisplay {
            position: pos2(10.0, 20.0),
            radius: 8.0,
        }
    }

    #[test]
    fn plain_node_is_border_body_and_glyph() {
        let program = program();
        let mut mesh = program.begin();
        program.process(&node("A"), &display(), NodeState::default(), &mut mesh);

        assert_eq!(mesh.vertices.len(), 12);
        assert!(mesh.is_valid());
        assert_eq!(mesh.texture_id, TextureId::default());
        assert_eq!(mesh.vertices[0].color, Color32::from_rgb(140, 140, 140));
    }

    #[test]
    fn selection_adds_a_halo() {
        let program = program();
        let mut mesh = program.begin();
        let state = NodeState {
            selected: true,
            ..NodeState::default()
        };
        program.process(&node("A"), &display(), state, &mut mesh);

        assert_eq!(mesh.vertices.len(), 16);
        let corners = mesh.vertices[..4]
            .iter()
            .map(|vertex| vertex.pos)
            .collect::<Vec<_>>();
        let halo = Rect::from_points(&corners);
        assert!((halo.width() - 8.0 * 2.0 * HALO_SCALE).abs() < 1e-4);
    }

    #[test]
    fn high_value_nodes_get_the_gold_border() {
        let program = program();
        let mut mesh = program.begin();
        let mut tier_zero = node("DA");
        tier_zero.high_value = true;
        program.process(&tier_zero, &display(), NodeState::default(), &mut mesh);

        assert_eq!(mesh.vertices[0].color, HIGH_VALUE_BORDER);
    }

    #[test]
    fn unknown_kinds_sample_the_fallback_glyph() {
        let program = program();
        let atlas = GlyphAtlas::build();
        let mut mesh = program.begin();
        let mut unknown = node("X");
        unknown.icon = None;
        program.process(&unknown, &display(), NodeState::default(), &mut mesh);

        let glyph_uv = mesh.vertices[8].uv;
        let fallback = atlas.glyph_uv(Some(GlyphKey::FALLBACK));
        assert!(fallback.contains(glyph_uv));
    }
}
