use eframe::egui::{Pos2, Vec2};

use super::geometry::edge_normal;

/// Parameter step used when sampling a curve into a polyline.
pub const RESOLUTION: f32 = 0.02;

/// Separation between neighbouring parallel edges, as a fraction of the
/// distance between their endpoints.
pub const CURVE_SPACING: f32 = 0.22;

/// Signed height of the curve at `position` within a group of `group_size`
/// parallel edges, as a fraction of edge length.
///
/// Heights grow linearly away from the centre of the group, so a group of one
/// is straight and a pair bends symmetrically. `forward` tells whether the
/// edge runs along the group's canonical direction; edges running against it
/// flip sign so the offset lands on the same side in world space.
pub fn curve_height(group_size: usize, position: usize, forward: bool) -> f32 {
    if group_size <= 1 {
        return 0.0;
    }
    let centre = (group_size - 1) as f32 / 2.0;
    let height = (position as f32 - centre) * CURVE_SPACING;
    if forward { height } else { -height }
}

pub fn control_point(start: Pos2, end: Pos2, height: f32) -> Pos2 {
    let midpoint = start.lerp(end, 0.5);
    midpoint + edge_normal(start, end) * (height * start.distance(end))
}

pub fn point_on_curve(start: Pos2, end: Pos2, control: Pos2, t: f32) -> Pos2 {
    let inverse = 1.0 - t;
    let x = inverse * inverse * start.x + 2.0 * inverse * t * control.x + t * t * end.x;
    let y = inverse * inverse * start.y + 2.0 * inverse * t * control.y + t * t * end.y;
    Pos2::new(x, y)
}

pub fn tangent_on_curve(start: Pos2, end: Pos2, control: Pos2, t: f32) -> Vec2 {
    (control - start) * (2.0 * (1.0 - t)) + (end - control) * (2.0 * t)
}

/// Samples the curve from `start` to `end`, both included.
pub fn sample_curve(start: Pos2, end: Pos2, control: Pos2) -> Vec<Pos2> {
    let steps = (1.0 / RESOLUTION).round() as usize;
    (0..=steps)
        .map(|step| point_on_curve(start, end, control, step as f32 / steps as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn lone_edges_are_straight() {
        assert_eq!(curve_height(1, 0, true), 0.0);
        assert_eq!(curve_height(0, 0, false), 0.0);
    }

    #[test]
    fn heights_are_symmetric_and_distinct() {
        let heights = (0..3)
            .map(|position| curve_height(3, position, true))
            .collect::<Vec<_>>();
        assert_eq!(heights[1], 0.0);
        assert_eq!(heights[0], -heights[2]);

        assert_ne!(curve_height(2, 0, true), curve_height(2, 1, true));
    }

    #[test]
    fn reversed_edges_bend_to_the_same_world_side() {
        let a = pos2(0.0, 0.0);
        let b = pos2(100.0, 0.0);
        let forward = control_point(a, b, curve_height(2, 1, true));
        let backward = control_point(b, a, curve_height(2, 1, false));
        assert!((forward - backward).length() < 1e-4);
    }

    #[test]
    fn samples_include_both_endpoints() {
        let start = pos2(0.0, 0.0);
        let end = pos2(10.0, 0.0);
        let samples = sample_curve(start, end, pos2(5.0, 5.0));

        assert_eq!(samples.len(), 51);
        assert_eq!(samples[0], start);
        assert!((samples[50] - end).length() < 1e-5);
        assert!((samples[25] - pos2(5.0, 2.5)).length() < 1e-5);
    }

    #[test]
    fn tangent_at_ends_points_at_the_control() {
        let start = pos2(0.0, 0.0);
        let control = pos2(5.0, 5.0);
        let end = pos2(10.0, 0.0);
        assert_eq!(tangent_on_curve(start, end, control, 0.0), vec2(10.0, 10.0));
        assert_eq!(tangent_on_curve(start, end, control, 1.0), vec2(10.0, -10.0));
    }
}
