use std::fmt;

use serde::{Deserialize, Serialize};

/// Hierarchical cache key such as `projects/4/files`.
///
/// Prefix matching is segment-wise: `projects/4` covers `projects/4/files` but
/// not `projects/42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The empty key, a prefix of every key.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    // ============================================================================
    // Key scheme
    // ============================================================================

    pub fn me() -> Self {
        Self::new(["me"])
    }

    pub fn projects() -> Self {
        Self::new(["projects"])
    }

    pub fn project(project_id: i64) -> Self {
        Self::projects().child(project_id.to_string())
    }

    pub fn project_files(project_id: i64) -> Self {
        Self::project(project_id).child("files")
    }

    pub fn file(project_id: i64, file_id: i64) -> Self {
        Self::project_files(project_id).child(file_id.to_string())
    }

    pub fn file_analysis(project_id: i64, file_id: i64) -> Self {
        Self::file(project_id, file_id).child("analysis")
    }

    pub fn file_analyses(project_id: i64, file_id: i64) -> Self {
        Self::file(project_id, file_id).child("analyses")
    }

    pub fn project_comparisons(project_id: i64) -> Self {
        Self::project(project_id).child("comparisons")
    }

    pub fn project_relationships(project_id: i64) -> Self {
        Self::project(project_id).child("relationships")
    }

    pub fn upload_analysis(upload_id: &str) -> Self {
        Self::new(["uploads", upload_id, "analysis"])
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}
