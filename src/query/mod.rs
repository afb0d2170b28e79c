mod kind;
mod raw;
mod source;

pub use kind::QueryKind;
pub use raw::{
    EDGE_KEY_PREFIX, FlatEdgeEntry, FlatNodeEntry, GraphData, QueryResult, RawCounts, TextLabel,
    WireEdge, WireNode,
};
pub use source::QuerySource;
