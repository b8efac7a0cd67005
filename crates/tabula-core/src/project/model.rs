use serde::{Deserialize, Serialize};

/// A named group of files that can be analyzed, compared and merged together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_count: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body for creating or updating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A tabular file stored inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub id: i64,
    #[serde(default)]
    pub project_id: Option<i64>,
    pub filename: String,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub column_count: u32,
    /// Column names in file order.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

/// Project metadata together with its files, as loaded by the project view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetail {
    pub project: Project,
    pub files: Vec<ProjectFile>,
}

impl ProjectDetail {
    pub fn file(&self, file_id: i64) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.id == file_id)
    }
}
