pub mod export;
pub mod limit;
pub mod model;
pub mod normalize;
pub mod snapshot;
pub mod style;

pub use limit::RENDER_LIMIT;
pub use model::{EdgeKey, FlatGraphResponse, GraphEdge, GraphNode};
pub use snapshot::{GraphSnapshot, QueryTicket, SnapshotPipeline};

#[cfg(test)]
pub(crate) use model::fixtures;
