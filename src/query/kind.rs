use std::fmt;

/// Query shapes the explore view knows how to display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Node,
    Relationship,
    Cypher,
    Composition,
    Pathfinding,
}

impl QueryKind {
    pub const ALL: [QueryKind; 5] = [
        Self::Node,
        Self::Relationship,
        Self::Cypher,
        Self::Composition,
        Self::Pathfinding,
    ];

    /// Unknown tags are not an error: the caller renders an empty graph.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "node" => Some(Self::Node),
            "relationship" | "edge" => Some(Self::Relationship),
            "cypher" => Some(Self::Cypher),
            "composition" => Some(Self::Composition),
            "pathfinding" | "shortest-path" => Some(Self::Pathfinding),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Relationship => "relationship",
            Self::Cypher => "cypher",
            Self::Composition => "composition",
            Self::Pathfinding => "pathfinding",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
