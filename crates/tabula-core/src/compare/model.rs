//! Comparison and merge payloads.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::analysis::{Chart, Insight};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComparisonType {
    /// Columns and types only.
    Schema,
    /// Distribution and summary statistics of shared columns.
    Statistics,
    Full,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
}

/// Body for `POST /projects/{id}/compare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub file_a_id: i64,
    pub file_b_id: i64,
    pub comparison_type: ComparisonType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub common_columns: Vec<String>,
    #[serde(default)]
    pub only_in_a: Vec<String>,
    #[serde(default)]
    pub only_in_b: Vec<String>,
    #[serde(default)]
    pub charts: Vec<Chart>,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

/// Body for `POST /projects/{id}/relationships`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDraft {
    pub file_a_id: i64,
    pub file_b_id: i64,
    pub join_key: String,
    pub join_type: JoinType,
}

/// A join definition stored on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: i64,
    pub file_a_id: i64,
    pub file_b_id: i64,
    pub join_key: String,
    #[serde(default)]
    pub join_type: JoinType,
}

/// Body for `POST /projects/{id}/merge-analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub relationship_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_intent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    #[serde(default)]
    pub merged_file_id: Option<i64>,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub column_names: Vec<String>,
    #[serde(default)]
    pub charts: Vec<Chart>,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

/// Columns present in both files, in file A's order.
pub fn common_columns(a: &[String], b: &[String]) -> Vec<String> {
    a.iter()
        .filter(|column| b.contains(column))
        .cloned()
        .collect()
}
