pub mod atlas;
pub mod bezier;
pub mod camera;
pub mod geometry;
pub mod programs;
pub mod scheduler;
pub mod shader;

pub use atlas::GlyphAtlas;
pub use camera::RenderParams;
pub use scheduler::FrameScheduler;
