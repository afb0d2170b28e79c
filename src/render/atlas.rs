//! Procedural glyph atlas.
//!
//! Every node shape lives in one RGBA texture so all nodes go out in a single
//! mesh. Glyphs are unions of signed distance primitives evaluated per pixel;
//! the texture stores white with coverage in alpha and vertex colors tint it.

use std::collections::HashMap;

use eframe::egui::{ColorImage, Pos2, Rect, pos2};

use crate::graph::style::GlyphKey;

use super::shader;

/// Side of one atlas cell in pixels.
pub const CELL_SIZE: usize = 64;
/// Rows wrap once they would exceed this width.
pub const MAX_ATLAS_WIDTH: usize = 2048;

/// Empty border inside each cell, in normalized cell units, so linear
/// filtering never samples a neighbouring cell.
const CELL_MARGIN: f32 = 0.06;
const EDGE_SOFTNESS_PX: f32 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AtlasSlot {
    /// Plain filled disc used for node bodies and borders.
    Disc,
    Glyph(GlyphKey),
}

#[derive(Clone, Copy, Debug)]
enum Primitive {
    Disc { center: [f32; 2], radius: f32 },
    Ring { center: [f32; 2], radius: f32, width: f32 },
    Segment { from: [f32; 2], to: [f32; 2], width: f32 },
    Rect { center: [f32; 2], half: [f32; 2] },
    Frame { center: [f32; 2], half: [f32; 2], width: f32 },
}

use Primitive::{Disc, Frame, Rect as Box2, Ring, Segment};

impl Primitive {
    fn distance(&self, point: [f32; 2]) -> f32 {
        match *self {
            Disc { center, radius } => length(sub(point, center)) - radius,
            Ring {
                center,
                radius,
                width,
            } => (length(sub(point, center)) - radius).abs() - width / 2.0,
            Segment { from, to, width } => segment_distance(point, from, to) - width / 2.0,
            Box2 { center, half } => box_distance(sub(point, center), half),
            Frame {
                center,
                half,
                width,
            } => box_distance(sub(point, center), half).abs() - width / 2.0,
        }
    }
}

fn sub(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

fn length(v: [f32; 2]) -> f32 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

fn segment_distance(point: [f32; 2], from: [f32; 2], to: [f32; 2]) -> f32 {
    let along = sub(to, from);
    let offset = sub(point, from);
    let length_sq = along[0] * along[0] + along[1] * along[1];
    let t = if length_sq > 0.0 {
        ((offset[0] * along[0] + offset[1] * along[1]) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    length([offset[0] - along[0] * t, offset[1] - along[1] * t])
}

fn box_distance(point: [f32; 2], half: [f32; 2]) -> f32 {
    let qx = point[0].abs() - half[0];
    let qy = point[1].abs() - half[1];
    let outside = length([qx.max(0.0), qy.max(0.0)]);
    outside + qx.max(qy).min(0.0)
}

const DISC: &[Primitive] = &[Disc {
    center: [0.0, 0.0],
    radius: 1.0,
}];

/// Glyph outlines in cell coordinates: x right, y down, both in [-1, 1].
#[rustfmt::skip]
fn primitives(glyph: GlyphKey) -> &'static [Primitive] {
    match glyph {
        GlyphKey::User => &[
            Disc { center: [0.0, -0.38], radius: 0.3 },
            Segment { from: [-0.3, 0.5], to: [0.3, 0.5], width: 0.55 },
        ],
        GlyphKey::Users => &[
            Disc { center: [-0.35, -0.3], radius: 0.22 },
            Disc { center: [0.35, -0.3], radius: 0.22 },
            Segment { from: [-0.55, 0.45], to: [-0.15, 0.45], width: 0.4 },
            Segment { from: [0.15, 0.45], to: [0.55, 0.45], width: 0.4 },
        ],
        GlyphKey::Desktop => &[
            Frame { center: [0.0, -0.15], half: [0.75, 0.5], width: 0.16 },
            Segment { from: [0.0, 0.35], to: [0.0, 0.6], width: 0.14 },
            Segment { from: [-0.35, 0.7], to: [0.35, 0.7], width: 0.14 },
        ],
        GlyphKey::Server => &[
            Frame { center: [0.0, -0.4], half: [0.7, 0.25], width: 0.14 },
            Frame { center: [0.0, 0.3], half: [0.7, 0.25], width: 0.14 },
            Disc { center: [0.4, -0.4], radius: 0.08 },
            Disc { center: [0.4, 0.3], radius: 0.08 },
        ],
        GlyphKey::Bolt => &[
            Segment { from: [0.25, -0.8], to: [-0.2, 0.05], width: 0.2 },
            Segment { from: [-0.2, 0.05], to: [0.2, -0.05], width: 0.2 },
            Segment { from: [0.2, -0.05], to: [-0.25, 0.8], width: 0.2 },
        ],
        GlyphKey::Lock => &[
            Box2 { center: [0.0, 0.3], half: [0.6, 0.42] },
            Ring { center: [0.0, -0.2], radius: 0.35, width: 0.14 },
        ],
        GlyphKey::Sitemap => &[
            Box2 { center: [0.0, -0.6], half: [0.22, 0.16] },
            Segment { from: [0.0, -0.45], to: [0.0, 0.35], width: 0.1 },
            Segment { from: [-0.6, -0.05], to: [0.6, -0.05], width: 0.1 },
            Segment { from: [-0.6, -0.05], to: [-0.6, 0.35], width: 0.1 },
            Segment { from: [0.6, -0.05], to: [0.6, 0.35], width: 0.1 },
            Box2 { center: [-0.6, 0.55], half: [0.2, 0.16] },
            Box2 { center: [0.0, 0.55], half: [0.2, 0.16] },
            Box2 { center: [0.6, 0.55], half: [0.2, 0.16] },
        ],
        GlyphKey::Cube => &[
            Frame { center: [0.1, 0.1], half: [0.5, 0.5], width: 0.12 },
            Frame { center: [-0.1, -0.1], half: [0.5, 0.5], width: 0.12 },
        ],
        GlyphKey::Cubes => &[
            Box2 { center: [-0.4, 0.35], half: [0.28, 0.28] },
            Box2 { center: [0.4, 0.35], half: [0.28, 0.28] },
            Box2 { center: [0.0, -0.4], half: [0.28, 0.28] },
        ],
        GlyphKey::Clipboard => &[
            Frame { center: [0.0, 0.1], half: [0.55, 0.7], width: 0.12 },
            Box2 { center: [0.0, -0.62], half: [0.25, 0.12] },
            Segment { from: [-0.3, -0.1], to: [0.3, -0.1], width: 0.1 },
            Segment { from: [-0.3, 0.2], to: [0.3, 0.2], width: 0.1 },
            Segment { from: [-0.3, 0.5], to: [0.3, 0.5], width: 0.1 },
        ],
        GlyphKey::Robot => &[
            Frame { center: [0.0, 0.1], half: [0.6, 0.45], width: 0.14 },
            Disc { center: [-0.25, 0.05], radius: 0.12 },
            Disc { center: [0.25, 0.05], radius: 0.12 },
            Segment { from: [0.0, -0.35], to: [0.0, -0.65], width: 0.1 },
            Disc { center: [0.0, -0.72], radius: 0.1 },
        ],
        GlyphKey::Key => &[
            Ring { center: [-0.4, 0.0], radius: 0.3, width: 0.16 },
            Segment { from: [-0.1, 0.0], to: [0.75, 0.0], width: 0.16 },
            Segment { from: [0.45, 0.0], to: [0.45, 0.3], width: 0.14 },
            Segment { from: [0.7, 0.0], to: [0.7, 0.25], width: 0.14 },
        ],
        GlyphKey::Cloud => &[
            Disc { center: [-0.35, 0.15], radius: 0.35 },
            Disc { center: [0.1, -0.15], radius: 0.45 },
            Disc { center: [0.45, 0.2], radius: 0.3 },
            Box2 { center: [0.05, 0.3], half: [0.45, 0.2] },
        ],
        GlyphKey::Box => &[
            Frame { center: [0.0, 0.15], half: [0.65, 0.5], width: 0.14 },
            Box2 { center: [0.0, -0.45], half: [0.75, 0.15] },
        ],
        GlyphKey::Window => &[
            Frame { center: [0.0, 0.0], half: [0.7, 0.6], width: 0.14 },
            Box2 { center: [0.0, -0.5], half: [0.7, 0.12] },
        ],
        GlyphKey::Cog => &[
            Ring { center: [0.0, 0.0], radius: 0.4, width: 0.24 },
            Segment { from: [0.0, -0.6], to: [0.0, -0.8], width: 0.22 },
            Segment { from: [0.0, 0.6], to: [0.0, 0.8], width: 0.22 },
            Segment { from: [-0.6, 0.0], to: [-0.8, 0.0], width: 0.22 },
            Segment { from: [0.6, 0.0], to: [0.8, 0.0], width: 0.22 },
            Segment { from: [0.43, 0.43], to: [0.56, 0.56], width: 0.22 },
            Segment { from: [-0.43, 0.43], to: [-0.56, 0.56], width: 0.22 },
            Segment { from: [0.43, -0.43], to: [0.56, -0.56], width: 0.22 },
            Segment { from: [-0.43, -0.43], to: [-0.56, -0.56], width: 0.22 },
        ],
        GlyphKey::Globe => &[
            Ring { center: [0.0, 0.0], radius: 0.7, width: 0.12 },
            Ring { center: [0.0, 0.0], radius: 0.32, width: 0.1 },
            Segment { from: [-0.7, 0.0], to: [0.7, 0.0], width: 0.1 },
            Segment { from: [0.0, -0.7], to: [0.0, 0.7], width: 0.1 },
        ],
        GlyphKey::List => &[
            Disc { center: [-0.55, -0.45], radius: 0.1 },
            Disc { center: [-0.55, 0.0], radius: 0.1 },
            Disc { center: [-0.55, 0.45], radius: 0.1 },
            Segment { from: [-0.3, -0.45], to: [0.65, -0.45], width: 0.14 },
            Segment { from: [-0.3, 0.0], to: [0.65, 0.0], width: 0.14 },
            Segment { from: [-0.3, 0.45], to: [0.65, 0.45], width: 0.14 },
        ],
        GlyphKey::Landmark => &[
            Segment { from: [-0.75, -0.45], to: [0.0, -0.8], width: 0.12 },
            Segment { from: [0.0, -0.8], to: [0.75, -0.45], width: 0.12 },
            Segment { from: [-0.5, -0.3], to: [-0.5, 0.45], width: 0.14 },
            Segment { from: [0.0, -0.3], to: [0.0, 0.45], width: 0.14 },
            Segment { from: [0.5, -0.3], to: [0.5, 0.45], width: 0.14 },
            Box2 { center: [0.0, 0.65], half: [0.75, 0.1] },
        ],
        GlyphKey::Building => &[
            Frame { center: [0.0, 0.05], half: [0.5, 0.75], width: 0.14 },
            Box2 { center: [-0.2, -0.35], half: [0.08, 0.08] },
            Box2 { center: [0.2, -0.35], half: [0.08, 0.08] },
            Box2 { center: [-0.2, 0.0], half: [0.08, 0.08] },
            Box2 { center: [0.2, 0.0], half: [0.08, 0.08] },
            Box2 { center: [0.0, 0.5], half: [0.12, 0.25] },
        ],
        GlyphKey::IdCard => &[
            Frame { center: [0.0, 0.0], half: [0.8, 0.55], width: 0.12 },
            Disc { center: [-0.35, -0.08], radius: 0.18 },
            Segment { from: [-0.55, 0.3], to: [-0.15, 0.3], width: 0.16 },
            Segment { from: [0.15, -0.15], to: [0.55, -0.15], width: 0.1 },
            Segment { from: [0.15, 0.15], to: [0.55, 0.15], width: 0.1 },
        ],
        GlyphKey::Question => &[
            Ring { center: [0.0, -0.3], radius: 0.35, width: 0.16 },
            Segment { from: [0.0, 0.05], to: [0.0, 0.35], width: 0.16 },
            Disc { center: [0.0, 0.62], radius: 0.1 },
        ],
    }
}

/// Packed glyph cells plus their texture coordinates.
///
/// Built once per session and shared between frames behind an `Arc`.
pub struct GlyphAtlas {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
    slots: HashMap<AtlasSlot, Rect>,
    disc_uv: Rect,
    fallback_uv: Rect,
}

impl GlyphAtlas {
    pub fn build() -> Self {
        let mut cells = vec![(AtlasSlot::Disc, DISC)];
        cells.extend(
            GlyphKey::ALL
                .iter()
                .map(|glyph| (AtlasSlot::Glyph(*glyph), primitives(*glyph))),
        );

        let columns = (MAX_ATLAS_WIDTH / CELL_SIZE).max(1);
        let width = cells.len().min(columns) * CELL_SIZE;
        let rows = cells.len().div_ceil(columns);
        let height = rows * CELL_SIZE;
        let mut rgba = vec![0u8; width * height * 4];

        let mut slots = HashMap::with_capacity(cells.len());
        for (index, (slot, shapes)) in cells.iter().enumerate() {
            let x0 = (index % columns) * CELL_SIZE;
            let y0 = (index / columns) * CELL_SIZE;
            rasterize_cell(&mut rgba, width, x0, y0, shapes);

            let uv = Rect::from_min_max(
                pos2(x0 as f32 / width as f32, y0 as f32 / height as f32),
                pos2(
                    (x0 + CELL_SIZE) as f32 / width as f32,
                    (y0 + CELL_SIZE) as f32 / height as f32,
                ),
            );
            slots.insert(*slot, uv);
        }

        let disc_uv = slots.get(&AtlasSlot::Disc).copied().unwrap_or(Rect::NOTHING);
        let fallback_uv = slots
            .get(&AtlasSlot::Glyph(GlyphKey::FALLBACK))
            .copied()
            .unwrap_or(disc_uv);

        tracing::debug!(width, height, cells = cells.len(), "built glyph atlas");

        Self {
            width,
            height,
            rgba,
            slots,
            disc_uv,
            fallback_uv,
        }
    }

    pub fn size(&self) -> [usize; 2] {
        [self.width, self.height]
    }

    pub fn disc_uv(&self) -> Rect {
        self.disc_uv
    }

    /// Texture coordinates for a glyph; kinds without one get the fallback.
    pub fn glyph_uv(&self, glyph: Option<GlyphKey>) -> Rect {
        glyph
            .and_then(|glyph| self.slots.get(&AtlasSlot::Glyph(glyph)))
            .copied()
            .unwrap_or(self.fallback_uv)
    }

    pub fn color_image(&self) -> ColorImage {
        ColorImage::from_rgba_unmultiplied(self.size(), &self.rgba)
    }

    #[cfg(test)]
    fn alpha_at(&self, uv: Pos2) -> u8 {
        let x = ((uv.x * self.width as f32) as usize).min(self.width - 1);
        let y = ((uv.y * self.height as f32) as usize).min(self.height - 1);
        self.rgba[(y * self.width + x) * 4 + 3]
    }
}

fn rasterize_cell(rgba: &mut [u8], stride: usize, x0: usize, y0: usize, shapes: &[Primitive]) {
    let scale = 2.0 / CELL_SIZE as f32;
    let feather = EDGE_SOFTNESS_PX * scale;
    let inner = 1.0 - CELL_MARGIN;

    for y in 0..CELL_SIZE {
        for x in 0..CELL_SIZE {
            let point = [
                ((x as f32 + 0.5) * scale - 1.0) / inner,
                ((y as f32 + 0.5) * scale - 1.0) / inner,
            ];
            let distance = shapes
                .iter()
                .map(|shape| shape.distance(point))
                .fold(f32::INFINITY, f32::min);
            let coverage = shader::sdf_coverage(distance, feather);

            let offset = ((y0 + y) * stride + x0 + x) * 4;
            rgba[offset..offset + 3].fill(255);
            rgba[offset + 3] = (coverage * 255.0).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_glyph_gets_a_distinct_cell() {
        let atlas = GlyphAtlas::build();
        let mut seen = Vec::new();
        for glyph in GlyphKey::ALL {
            let uv = atlas.glyph_uv(Some(glyph));
            assert!(!seen.contains(&uv), "{glyph:?} shares a cell");
            seen.push(uv);
        }
        assert!(!seen.contains(&atlas.disc_uv()));
    }

    #[test]
    fn missing_glyph_uses_the_fallback_cell() {
        let atlas = GlyphAtlas::build();
        assert_eq!(atlas.glyph_uv(None), atlas.glyph_uv(Some(GlyphKey::FALLBACK)));
    }

    #[test]
    fn atlas_fits_the_width_limit() {
        let atlas = GlyphAtlas::build();
        let [width, height] = atlas.size();
        assert!(width <= MAX_ATLAS_WIDTH);
        assert_eq!(width % CELL_SIZE, 0);
        assert_eq!(height % CELL_SIZE, 0);
        assert_eq!(atlas.color_image().size, [width, height]);
    }

    #[test]
    fn disc_cell_is_solid_in_the_middle_and_clear_in_the_corner() {
        let atlas = GlyphAtlas::build();
        let uv = atlas.disc_uv();
        assert_eq!(atlas.alpha_at(uv.center()), 255);
        assert_eq!(atlas.alpha_at(uv.min), 0);
    }

    #[test]
    fn glyph_cells_have_ink() {
        let atlas = GlyphAtlas::build();
        for glyph in GlyphKey::ALL {
            let uv = atlas.glyph_uv(Some(glyph));
            let inked = (0..16)
                .flat_map(|y| (0..16).map(move |x| (x, y)))
                .filter(|(x, y)| {
                    let sample = pos2(
                        uv.min.x + uv.width() * (*x as f32 + 0.5) / 16.0,
                        uv.min.y + uv.height() * (*y as f32 + 0.5) / 16.0,
                    );
                    atlas.alpha_at(sample) > 128
                })
                .count();
            assert!(inked > 0, "{glyph:?} rendered empty");
        }
    }

    #[test]
    fn box_distance_is_signed() {
        assert!(box_distance([0.0, 0.0], [0.5, 0.5]) < 0.0);
        assert!((box_distance([1.0, 0.0], [0.5, 0.5]) - 0.5).abs() < 1e-6);
    }
}
