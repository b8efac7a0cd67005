//! Analysis payloads: charts, insights and dataset summaries.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::project::ProjectFile;

/// Chart families the backend produces.
///
/// Unknown kinds deserialize to [`ChartType::Other`] so a new chart type on the
/// server does not break decoding of the whole analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Histogram,
    Area,
    Heatmap,
    #[serde(other)]
    Other,
}

/// A render-ready chart. `spec` is passed to the charting layer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: String,
    pub title: String,
    pub chart_type: ChartType,
    #[serde(default)]
    pub spec: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
}

/// An AI-written observation about the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub importance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    #[serde(default)]
    pub dtype: Option<String>,
    #[serde(default)]
    pub missing: u64,
    #[serde(default)]
    pub unique: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatasetSummary {
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub column_count: u32,
    #[serde(default)]
    pub columns: Vec<ColumnSummary>,
}

/// Charts and insights generated for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisResult {
    /// Set when the backend persisted the analysis.
    #[serde(default)]
    pub analysis_id: Option<i64>,
    #[serde(default)]
    pub summary: Option<DatasetSummary>,
    #[serde(default)]
    pub charts: Vec<Chart>,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

impl AnalysisResult {
    pub fn is_persisted(&self) -> bool {
        self.analysis_id.is_some()
    }
}

/// Response of the ephemeral `/api/upload` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub upload_id: String,
    pub filename: String,
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub columns: u32,
    #[serde(default)]
    pub column_names: Vec<String>,
    #[serde(default)]
    pub preview: Vec<serde_json::Value>,
}

/// What the analysis flow knows about an uploaded file, whichever endpoint stored it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDataset {
    pub id: String,
    pub filename: String,
    pub row_count: u64,
    pub column_names: Vec<String>,
}

impl From<UploadResult> for UploadedDataset {
    fn from(result: UploadResult) -> Self {
        Self {
            id: result.upload_id,
            filename: result.filename,
            row_count: result.rows,
            column_names: result.column_names,
        }
    }
}

impl From<ProjectFile> for UploadedDataset {
    fn from(file: ProjectFile) -> Self {
        Self {
            id: file.id.to_string(),
            filename: file.filename,
            row_count: file.row_count,
            column_names: file.columns,
        }
    }
}

/// Body for `POST /projects/{id}/files/{fileId}/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnalyzeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_intent: Option<String>,
    /// Whether the backend should keep the result in the file's analysis history.
    pub persist: bool,
}

/// An analysis kept in a file's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAnalysis {
    pub id: i64,
    pub file_id: i64,
    #[serde(default)]
    pub user_intent: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub charts: Vec<Chart>,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

/// Body for `POST /api/charts/insight`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartInsightRequest {
    pub chart: Chart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_intent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartInsight {
    pub insight: String,
}
