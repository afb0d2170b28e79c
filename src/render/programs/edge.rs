use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_3, FRAC_PI_4, PI, TAU};

use eframe::egui::epaint::Mesh;
use eframe::egui::{Pos2, Vec2};

use crate::graph::GraphEdge;
use crate::render::bezier::{self, RESOLUTION};
use crate::render::geometry::clamp_to_radius;

use super::{
    ArrowheadProgram, ClampedLineProgram, EdgeDisplay, EdgeProgram, NODE_GAP_PX, NodeDisplay,
};

/// Arrowheads never get shorter than this, in pixels.
pub const ARROW_MIN_PX: f32 = 9.0;
/// Arrow length per pixel of line width.
pub const ARROW_SCALE: f32 = 4.0;
/// How far the line body reaches under the arrowhead, in pixels.
pub const ARROW_OVERLAP_PX: f32 = 1.0;

const LOOP_RADIUS_PX: f32 = 14.0;
/// Minimum loop radius per unit of arrow base distance from the node centre.
/// The far side of the loop lies at least two radii out, past the arrow base.
const LOOP_ARROW_CLEARANCE: f32 = 0.6;
const MIN_SEPARATION_PX: f32 = 1.0;

/// Position of an edge among the edges sharing its endpoint pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelSlot {
    pub position: usize,
    pub group_size: usize,
    /// Runs along the pair's canonical direction (lower id to higher id).
    pub forward: bool,
    pub self_loop: bool,
}

impl ParallelSlot {
    pub const SINGLE: ParallelSlot = ParallelSlot {
        position: 0,
        group_size: 1,
        forward: true,
        self_loop: false,
    };

    pub fn height(&self) -> f32 {
        bezier::curve_height(self.group_size, self.position, self.forward)
    }
}

/// Assigns every edge its slot among the edges joining the same two nodes,
/// regardless of direction. Positions follow input order.
pub fn parallel_slots(edges: &[GraphEdge]) -> Vec<ParallelSlot> {
    fn pair(edge: &GraphEdge) -> (&str, &str) {
        if edge.source <= edge.target {
            (edge.source.as_str(), edge.target.as_str())
        } else {
            (edge.target.as_str(), edge.source.as_str())
        }
    }

    let mut sizes = HashMap::<(&str, &str), usize>::new();
    for edge in edges {
        *sizes.entry(pair(edge)).or_default() += 1;
    }

    let mut assigned = HashMap::<(&str, &str), usize>::new();
    edges
        .iter()
        .map(|edge| {
            let key = pair(edge);
            let position = assigned.entry(key).or_default();
            let slot = ParallelSlot {
                position: *position,
                group_size: sizes.get(&key).copied().unwrap_or(1),
                forward: edge.source <= edge.target,
                self_loop: edge.is_self_loop(),
            };
            *position += 1;
            slot
        })
        .collect()
}

pub fn arrow_length(display: &EdgeDisplay) -> f32 {
    (display.width * ARROW_SCALE).max(ARROW_MIN_PX) * display.pixel()
}

/// Edge endpoints after clamping to the node rims.
#[derive(Clone, Debug, PartialEq)]
pub struct ClampedEdge {
    /// Visible line body, from just outside the source to under the arrow.
    pub body: Vec<Pos2>,
    pub tip: Pos2,
    /// Centre of the arrowhead's back edge.
    pub base: Pos2,
}

/// Centerline of one edge plus its clamped form.
#[derive(Clone, Debug)]
pub struct EdgePath {
    samples: Vec<Pos2>,
    clamped: Option<ClampedEdge>,
}

impl EdgePath {
    pub fn resolve(source: NodeDisplay, target: NodeDisplay, display: &EdgeDisplay) -> Self {
        let pixel = display.pixel();
        let gap = NODE_GAP_PX * pixel;
        let arrow = arrow_length(display);
        let too_close = source.position.distance(target.position) < MIN_SEPARATION_PX * pixel;

        let (samples, target) = if display.slot.self_loop || too_close {
            let radius = (LOOP_RADIUS_PX * pixel)
                .max(source.radius * 0.8)
                .max((source.radius + gap + arrow) * LOOP_ARROW_CLEARANCE);
            (loop_samples(source, display.slot.position, radius), source)
        } else {
            let height = display.slot.height();
            let samples = if height == 0.0 {
                vec![source.position, target.position]
            } else {
                let control = bezier::control_point(source.position, target.position, height);
                bezier::sample_curve(source.position, target.position, control)
            };
            (samples, target)
        };

        let clamped = clamp_path(&samples, source, target, gap, arrow, ARROW_OVERLAP_PX * pixel);
        Self { samples, clamped }
    }

    /// Unclamped centerline, node centre to node centre.
    pub fn samples(&self) -> &[Pos2] {
        &self.samples
    }

    /// `None` when the nodes sit too close for any edge geometry.
    pub fn clamped(&self) -> Option<&ClampedEdge> {
        self.clamped.as_ref()
    }
}

/// Loops leave and re-enter the node on the side picked by `position`, so
/// several self-relationships fan out instead of stacking.
fn loop_samples(node: NodeDisplay, position: usize, radius: f32) -> Vec<Pos2> {
    let angle = -FRAC_PI_4 + position as f32 * FRAC_PI_3;
    // At least one radius out, so the loop never encloses the node centre.
    let offset = (node.radius + radius * 0.6).max(radius);
    let centre = node.position + Vec2::angled(angle) * offset;
    let steps = (1.0 / RESOLUTION).round() as usize;

    (0..=steps)
        .map(|step| {
            let theta = angle + PI + TAU * step as f32 / steps as f32;
            centre + Vec2::angled(theta) * radius
        })
        .collect()
}

fn clamp_path(
    samples: &[Pos2],
    source: NodeDisplay,
    target: NodeDisplay,
    gap: f32,
    arrow: f32,
    overlap: f32,
) -> Option<ClampedEdge> {
    let start_radius = source.radius + gap;
    let tip_radius = target.radius + gap;
    let base_radius = tip_radius + arrow;
    let end_radius = base_radius - overlap;

    let first = samples
        .iter()
        .position(|point| point.distance(source.position) > start_radius)?;
    let last = samples
        .iter()
        .rposition(|point| point.distance(target.position) > base_radius)?;

    let start = clamp_to_radius(samples[first], source.position, start_radius);
    let anchor = samples[last];
    let end = clamp_to_radius(anchor, target.position, end_radius);

    if start.distance(target.position) <= target.radius
        || end.distance(source.position) <= source.radius
    {
        return None;
    }
    // No sample clears both rims: the clamped ends must still face each other.
    if first > last && start.distance(target.position) <= end_radius {
        return None;
    }

    let mut body = Vec::with_capacity(last.saturating_sub(first) + 3);
    body.push(start);
    if first <= last {
        body.extend_from_slice(&samples[first..=last]);
    }
    body.push(end);

    Some(ClampedEdge {
        body,
        tip: clamp_to_radius(anchor, target.position, tip_radius),
        base: clamp_to_radius(anchor, target.position, base_radius),
    })
}

/// Line body plus arrowhead, drawn from one shared path.
pub struct CompoundEdgeProgram {
    programs: Vec<Box<dyn EdgeProgram>>,
}

impl CompoundEdgeProgram {
    pub fn new(programs: Vec<Box<dyn EdgeProgram>>) -> Self {
        Self { programs }
    }

    pub fn standard() -> Self {
        Self::new(vec![Box::new(ClampedLineProgram), Box::new(ArrowheadProgram)])
    }

    /// Emits geometry for one edge and returns the resolved path for hit testing.
    pub fn process(
        &self,
        source: NodeDisplay,
        target: NodeDisplay,
        display: &EdgeDisplay,
        mesh: &mut Mesh,
    ) -> EdgePath {
        let path = EdgePath::resolve(source, target, display);
        for program in &self.programs {
            program.process(&path, display, mesh);
        }
        path
    }
}
