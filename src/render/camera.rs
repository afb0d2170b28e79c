use eframe::egui::epaint::Mesh;
use eframe::egui::{Pos2, Rect, Vec2};

use super::shader;

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 6.0;

/// Per-frame uniforms shared by every drawing program.
///
/// Programs emit geometry in world space; `apply` moves a finished mesh to
/// screen space in one pass, the way a vertex shader applies its matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParams {
    pub rect: Rect,
    pub pan: Vec2,
    pub zoom: f32,
}

impl RenderParams {
    pub fn new(rect: Rect, pan: Vec2, zoom: f32) -> Self {
        Self {
            rect,
            pan,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        self.rect.center() + self.pan + world.to_vec2() * self.zoom
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen - self.rect.center() - self.pan) / self.zoom).to_pos2()
    }

    /// World-space length of one screen pixel.
    pub fn pixel(&self) -> f32 {
        1.0 / self.zoom
    }

    /// Feather band in world units.
    pub fn feather(&self) -> f32 {
        shader::feather_pixels(self.rect.size()) * self.pixel()
    }

    pub fn apply(&self, mesh: &mut Mesh) {
        for vertex in &mut mesh.vertices {
            vertex.pos = self.world_to_screen(vertex.pos);
        }
    }

    /// Zooms around `anchor` (screen space), keeping the world point under it fixed.
    pub fn zoom_around(&mut self, anchor: Pos2, factor: f32) {
        let world_before = self.screen_to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - self.rect.center() - world_before.to_vec2() * self.zoom;
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn params() -> RenderParams {
        RenderParams::new(
            Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0)),
            vec2(25.0, -10.0),
            2.0,
        )
    }

    #[test]
    fn screen_and_world_are_inverse() {
        let params = params();
        let world = pos2(13.0, -42.0);
        let back = params.screen_to_world(params.world_to_screen(world));
        assert!((back - world).length() < 1e-4);
    }

    #[test]
    fn zoom_around_keeps_anchor_fixed() {
        let mut params = params();
        let anchor = pos2(120.0, 80.0);
        let before = params.screen_to_world(anchor);
        params.zoom_around(anchor, 1.1);
        let after = params.screen_to_world(anchor);
        assert!((before - after).length() < 1e-3);
        assert!((params.zoom - 2.2).abs() < 1e-5);
    }

    #[test]
    fn zoom_is_clamped() {
        let params = RenderParams::new(Rect::ZERO, Vec2::ZERO, 100.0);
        assert_eq!(params.zoom, MAX_ZOOM);
    }
}
