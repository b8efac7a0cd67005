//! Analysis domain module.
//!
//! # Module Structure
//!
//! - `model`: Charts, insights and upload/analysis payloads
//! - `upload`: File admission rules (`SelectedFile`, `validate_file`)
//! - `flow`: The upload → analyze state machine (`AnalysisFlowState`)

mod flow;
mod model;
mod upload;

pub use flow::{AnalysisFlowState, AnalysisStage, FlowEvent};
pub use model::{
    AnalysisResult, AnalyzeRequest, Chart, ChartInsight, ChartInsightRequest, ChartType,
    ColumnSummary, DatasetSummary, Insight, PersistedAnalysis, UploadResult, UploadedDataset,
};
pub use upload::{format_size, infer_mime_type, validate_file, SelectedFile};
