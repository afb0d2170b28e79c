//! Fragment-stage math shared by the edge programs and the glyph atlas.
//!
//! Edges are drawn as quads wider than the visible line. Each vertex carries
//! its signed distance from the centerline and the alpha this stage assigns
//! to that distance, so the GPU's linear interpolation produces the feathered
//! rim without multisampling.

use eframe::egui::{Color32, Vec2};

/// Feather width in normalized viewport units.
pub const FEATHER: f32 = 0.001;

/// Lower bound so tiny viewports still get a visible anti-aliasing band.
const MIN_FEATHER_PX: f32 = 0.75;

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Alpha of a fragment `distance` away from the centerline of a line whose
/// half-thickness (feather included) is `thickness`.
pub fn edge_alpha(distance: f32, thickness: f32, feather: f32) -> f32 {
    let distance = distance.abs();
    if !(distance <= thickness) {
        return 0.0;
    }
    1.0 - smoothstep(thickness - feather, thickness, distance)
}

/// Coverage of a signed distance field sample: negative inside the shape.
pub fn sdf_coverage(signed_distance: f32, feather: f32) -> f32 {
    1.0 - smoothstep(-feather, feather, signed_distance)
}

/// Feather width in screen pixels for the given viewport. Zoom does not enter
/// here, which keeps edges equally crisp at every scale.
pub fn feather_pixels(viewport: Vec2) -> f32 {
    (FEATHER * viewport.x.max(viewport.y)).max(MIN_FEATHER_PX)
}

pub fn shade(color: Color32, distance: f32, thickness: f32, feather: f32) -> Color32 {
    color.gamma_multiply(edge_alpha(distance, thickness, feather))
}
