use eframe::egui::epaint::{Mesh, Vertex, WHITE_UV};
use eframe::egui::{Color32, Pos2, Vec2, vec2};

use super::shader;

/// Normal returned for coincident points, so degenerate edges never yield NaN.
pub const FALLBACK_NORMAL: Vec2 = Vec2::Y;

/// Node radius in screen pixels at zoom 1 for a node of size 1.
pub const NODE_BASE_RADIUS: f32 = 9.0;
const MIN_NODE_RADIUS_PX: f32 = 2.5;
const MAX_NODE_RADIUS_PX: f32 = 46.0;
const HIGHLIGHT_SCALE: f32 = 1.2;

const MIN_ZOOM: f32 = 1e-4;
const EPSILON: f32 = 1e-6;

/// Unit vector perpendicular to `source -> target`.
pub fn edge_normal(source: Pos2, target: Pos2) -> Vec2 {
    let delta = target - source;
    let length = delta.length();
    if !(length > EPSILON) {
        return FALLBACK_NORMAL;
    }
    vec2(-delta.y / length, delta.x / length)
}

/// World-space width that renders as `base_width` screen pixels at `zoom`.
pub fn thickness_at(zoom: f32, base_width: f32) -> f32 {
    base_width / zoom.max(MIN_ZOOM)
}

/// Point at `radius` from `center` in the direction of `point`.
pub fn clamp_to_radius(point: Pos2, center: Pos2, radius: f32) -> Pos2 {
    let delta = point - center;
    let length = delta.length();
    if !(length > EPSILON) {
        return center + FALLBACK_NORMAL * radius;
    }
    center + delta * (radius / length)
}

/// World-space radius of a node.
///
/// The on-screen radius grows sublinearly with zoom, so zooming in spreads the
/// graph out faster than it inflates the nodes.
pub fn node_radius(size: f32, zoom: f32, highlighted: bool) -> f32 {
    let zoom = zoom.max(MIN_ZOOM);
    let scale = if highlighted { HIGHLIGHT_SCALE } else { 1.0 };
    let size = if size.is_finite() && size > 0.0 { size } else { 1.0 };
    let pixels = (NODE_BASE_RADIUS * size * zoom.powf(0.40) * scale)
        .clamp(MIN_NODE_RADIUS_PX, MAX_NODE_RADIUS_PX);
    pixels / zoom
}

/// Tessellates a polyline into a feathered triangle strip.
///
/// Each sample emits four vertices across the line: the two outer ones sit on
/// the feather rim and fade out, the two inner ones carry the full color.
pub fn stroke_polyline(
    points: &[Pos2],
    half_width: f32,
    feather: f32,
    color: Color32,
    mesh: &mut Mesh,
) {
    if points.len() < 2 || !(half_width > 0.0) {
        return;
    }

    let outer = half_width + feather;
    let offsets = [-outer, -half_width, half_width, outer];
    let base = mesh.vertices.len() as u32;

    for (index, point) in points.iter().enumerate() {
        let (normal, miter) = vertex_normal(points, index);
        for offset in offsets {
            mesh.vertices.push(Vertex {
                pos: *point + normal * (offset * miter),
                uv: WHITE_UV,
                color: shader::shade(color, offset, outer, feather),
            });
        }
    }

    for segment in 0..(points.len() as u32 - 1) {
        let a = base + segment * 4;
        let b = a + 4;
        for lane in 0..3 {
            mesh.add_triangle(a + lane, a + lane + 1, b + lane);
            mesh.add_triangle(a + lane + 1, b + lane + 1, b + lane);
        }
    }
}

/// Averaged normal at a polyline joint plus the miter length that keeps the
/// stroke width constant across the bend.
fn vertex_normal(points: &[Pos2], index: usize) -> (Vec2, f32) {
    let last = points.len() - 1;
    if index == 0 {
        return (edge_normal(points[0], points[1]), 1.0);
    }
    if index == last {
        return (edge_normal(points[last - 1], points[last]), 1.0);
    }

    let before = edge_normal(points[index - 1], points[index]);
    let after = edge_normal(points[index], points[index + 1]);
    let sum = before + after;
    let length = sum.length();
    if !(length > EPSILON) {
        return (after, 1.0);
    }

    let averaged = sum / length;
    let miter = 1.0 / averaged.dot(after).max(0.5);
    (averaged, miter)
}

/// Shortest distance from `point` to a polyline.
pub fn distance_to_polyline(point: Pos2, points: &[Pos2]) -> f32 {
    match points {
        [] => f32::INFINITY,
        [single] => single.distance(point),
        _ => points
            .windows(2)
            .map(|pair| distance_to_segment(point, pair[0], pair[1]))
            .fold(f32::INFINITY, f32::min),
    }
}

/// Point halfway along a polyline, measured by length.
pub fn polyline_midpoint(points: &[Pos2]) -> Option<Pos2> {
    let (first, rest) = points.split_first()?;
    let total = points
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum::<f32>();

    let mut remaining = total / 2.0;
    let mut previous = *first;
    for point in rest {
        let length = previous.distance(*point);
        if length >= remaining && length > EPSILON {
            return Some(previous.lerp(*point, remaining / length));
        }
        remaining -= length;
        previous = *point;
    }
    Some(previous)
}

fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn normal_is_perpendicular_unit() {
        let normal = edge_normal(pos2(0.0, 0.0), pos2(10.0, 0.0));
        assert!((normal.length() - 1.0).abs() < 1e-6);
        assert_eq!(normal, vec2(0.0, 1.0));
    }

    #[test]
    fn coincident_points_use_the_fallback_normal() {
        let point = pos2(3.0, 4.0);
        assert_eq!(edge_normal(point, point), FALLBACK_NORMAL);
        assert_eq!(clamp_to_radius(point, point, 2.0), pos2(3.0, 6.0));
    }

    #[test]
    fn thickness_keeps_screen_width_constant() {
        for zoom in [0.1, 0.5, 1.0, 3.0, 6.0] {
            assert!((thickness_at(zoom, 1.5) * zoom - 1.5).abs() < 1e-5);
        }
    }

    #[test]
    fn highlighted_nodes_are_larger() {
        assert!(node_radius(1.0, 1.0, true) > node_radius(1.0, 1.0, false));
        assert!(node_radius(f32::NAN, 1.0, false).is_finite());
    }

    #[test]
    fn strip_has_four_vertices_per_sample() {
        let mut mesh = Mesh::default();
        let points = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(20.0, 5.0)];
        stroke_polyline(&points, 1.0, 0.5, Color32::WHITE, &mut mesh);

        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.indices.len(), 2 * 6 * 3);
        assert!(mesh.is_valid());
        assert_eq!(mesh.vertices[0].color, Color32::TRANSPARENT);
        assert_eq!(mesh.vertices[1].color, Color32::WHITE);
    }

    #[test]
    fn polyline_distance() {
        let points = [pos2(0.0, 0.0), pos2(10.0, 0.0)];
        assert!((distance_to_polyline(pos2(5.0, 3.0), &points) - 3.0).abs() < 1e-6);
        assert!((distance_to_polyline(pos2(13.0, 4.0), &points) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn midpoint_is_measured_along_the_line() {
        let straight = [pos2(0.0, 0.0), pos2(10.0, 0.0)];
        assert_eq!(polyline_midpoint(&straight), Some(pos2(5.0, 0.0)));

        let bent = [pos2(0.0, 0.0), pos2(0.0, 10.0), pos2(30.0, 10.0)];
        assert_eq!(polyline_midpoint(&bent), Some(pos2(10.0, 10.0)));

        assert_eq!(polyline_midpoint(&[pos2(2.0, 3.0)]), Some(pos2(2.0, 3.0)));
        assert_eq!(polyline_midpoint(&[]), None);
    }

    proptest! {
        #[test]
        fn normals_are_finite_units(
            ax in -1e4f32..1e4, ay in -1e4f32..1e4,
            bx in -1e4f32..1e4, by in -1e4f32..1e4,
        ) {
            let normal = edge_normal(pos2(ax, ay), pos2(bx, by));
            prop_assert!(normal.x.is_finite() && normal.y.is_finite());
            prop_assert!((normal.length() - 1.0).abs() < 1e-3);
        }

        #[test]
        fn clamped_points_lie_on_the_circle(
            px in -1e3f32..1e3, py in -1e3f32..1e3,
            cx in -1e3f32..1e3, cy in -1e3f32..1e3,
            radius in 0.1f32..100.0,
        ) {
            let center = pos2(cx, cy);
            let clamped = clamp_to_radius(pos2(px, py), center, radius);
            prop_assert!((clamped.distance(center) - radius).abs() < radius * 1e-3 + 1e-3);
        }
    }
}
