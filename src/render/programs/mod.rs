//! Drawing programs.
//!
//! A program turns one node or edge into mesh geometry in world space. The
//! caller batches a whole frame into one mesh per program family and applies
//! [`RenderParams`](super::camera::RenderParams) once at the end.

mod arrowhead;
mod clamped_line;
mod edge;
mod node;

use eframe::egui::epaint::Mesh;
use eframe::egui::{Color32, Pos2};

pub use arrowhead::ArrowheadProgram;
pub use clamped_line::ClampedLineProgram;
pub use edge::{
    ARROW_MIN_PX, ARROW_SCALE, CompoundEdgeProgram, EdgePath, ParallelSlot, parallel_slots,
};
pub use node::{GlyphNodeProgram, NodeState};

/// Distance kept between a node's rim and the edge geometry touching it, in pixels.
pub const NODE_GAP_PX: f32 = 1.5;

/// Where a node sits in world space and how large it currently is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeDisplay {
    pub position: Pos2,
    pub radius: f32,
}

/// Per-edge drawing attributes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeDisplay {
    pub color: Color32,
    /// Line width in screen pixels.
    pub width: f32,
    pub zoom: f32,
    /// Feather band in world units.
    pub feather: f32,
    pub slot: ParallelSlot,
}

impl EdgeDisplay {
    /// World-space length of one screen pixel.
    pub fn pixel(&self) -> f32 {
        1.0 / self.zoom.max(1e-4)
    }
}

/// A sub-program of the compound edge program.
///
/// Sub-programs receive the same resolved path, so the line body and the
/// arrowhead always agree on where the edge ends.
pub trait EdgeProgram: Send + Sync {
    fn process(&self, path: &EdgePath, display: &EdgeDisplay, mesh: &mut Mesh);
}
