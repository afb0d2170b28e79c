use eframe::egui::epaint::Mesh;

use crate::render::geometry::{stroke_polyline, thickness_at};

use super::{EdgeDisplay, EdgePath, EdgeProgram};

/// Line body of an edge, trimmed so it starts outside the source node and
/// stops just under the arrowhead.
pub struct ClampedLineProgram;

impl EdgeProgram for ClampedLineProgram {
    fn process(&self, path: &EdgePath, display: &EdgeDisplay, mesh: &mut Mesh) {
        let Some(clamped) = path.clamped() else {
            return;
        };
        let half_width = thickness_at(display.zoom, display.width) / 2.0;
        stroke_polyline(
            &clamped.body,
            half_width,
            display.feather,
            display.color,
            mesh,
        );
    }
}
