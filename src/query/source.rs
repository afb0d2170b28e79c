use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::QueryResult;

/// A saved query result on disk plus the kind tag it was produced by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySource {
    pub path: PathBuf,
    pub kind_tag: String,
}

impl QuerySource {
    pub fn new(path: impl Into<PathBuf>, kind_tag: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind_tag: kind_tag.into(),
        }
    }

    /// Reads and decodes the result. `Ok(None)` means the kind tag is unknown.
    pub fn fetch(&self) -> Result<Option<QueryResult>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let result = QueryResult::decode_str(&self.kind_tag, &text)
            .with_context(|| format!("failed to decode {}", self.path.display()))?;

        if let Some(result) = &result {
            let counts = result.raw_counts();
            tracing::debug!(
                kind = %result.kind(),
                nodes = counts.nodes,
                edges = counts.edges,
                "decoded query result"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::process;

    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("secgraph-{}-{name}", process::id()));
        fs::write(&path, contents).expect("temp dir is writable");
        path
    }

    #[test]
    fn fetch_decodes_a_saved_result() {
        let path = scratch_file(
            "cypher.json",
            r#"{"nodes": {"1": {"label": "A", "kind": "User"}}, "edges": []}"#,
        );
        let result = QuerySource::new(&path, "cypher").fetch();
        let _ = fs::remove_file(&path);

        let result = result.expect("readable").expect("known kind");
        assert_eq!(result.raw_counts().nodes, 1);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let error = QuerySource::new("/nonexistent/secgraph.json", "cypher")
            .fetch()
            .expect_err("file does not exist");
        assert!(format!("{error:#}").contains("/nonexistent/secgraph.json"));
    }

    #[test]
    fn unknown_kind_fetches_nothing() {
        let path = scratch_file("unknown.json", r#"{"nodes": {}}"#);
        let result = QuerySource::new(&path, "saved-query").fetch();
        let _ = fs::remove_file(&path);

        assert!(result.expect("readable").is_none());
    }
}
