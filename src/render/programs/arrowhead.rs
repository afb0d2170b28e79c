use eframe::egui::epaint::{Mesh, Vertex, WHITE_UV};
use eframe::egui::{Color32, Pos2};

use crate::render::geometry::edge_normal;
use crate::render::shader;

use super::{EdgeDisplay, EdgePath, EdgeProgram};

/// Width of the arrowhead's back edge relative to its length.
const ARROW_WIDTH_RATIO: f32 = 1.0;

/// Filled triangle at the target end of an edge, with a feathered rim.
pub struct ArrowheadProgram;

impl EdgeProgram for ArrowheadProgram {
    fn process(&self, path: &EdgePath, display: &EdgeDisplay, mesh: &mut Mesh) {
        let Some(clamped) = path.clamped() else {
            return;
        };

        let length = clamped.base.distance(clamped.tip);
        let half_width = length * ARROW_WIDTH_RATIO / 2.0;
        let normal = edge_normal(clamped.base, clamped.tip);
        let corners = [
            clamped.tip,
            clamped.base + normal * half_width,
            clamped.base - normal * half_width,
        ];
        push_feathered_triangle(corners, display.feather, display.color, mesh);
    }
}

fn push_feathered_triangle(corners: [Pos2; 3], feather: f32, color: Color32, mesh: &mut Mesh) {
    let centroid = Pos2::new(
        (corners[0].x + corners[1].x + corners[2].x) / 3.0,
        (corners[0].y + corners[1].y + corners[2].y) / 3.0,
    );
    let rim = shader::shade(color, feather, feather, feather);

    let base = mesh.vertices.len() as u32;
    for corner in corners {
        mesh.vertices.push(Vertex {
            pos: corner,
            uv: WHITE_UV,
            color,
        });
    }
    for corner in corners {
        let outward = (corner - centroid).normalized();
        mesh.vertices.push(Vertex {
            pos: corner + outward * (feather * 1.5),
            uv: WHITE_UV,
            color: rim,
        });
    }

    mesh.add_triangle(base, base + 1, base + 2);
    for side in 0..3 {
        let inner_a = base + side;
        let inner_b = base + (side + 1) % 3;
        let outer_a = inner_a + 3;
        let outer_b = inner_b + 3;
        mesh.add_triangle(inner_a, inner_b, outer_b);
        mesh.add_triangle(inner_a, outer_b, outer_a);
    }
}
