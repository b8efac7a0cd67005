//! The request layer seam.
//!
//! One method per backend endpoint. The HTTP implementation lives in
//! `tabula-interaction`; flows depend only on this trait.

use async_trait::async_trait;

use crate::analysis::{
    AnalysisResult, AnalyzeRequest, ChartInsight, ChartInsightRequest, PersistedAnalysis,
    SelectedFile, UploadResult,
};
use crate::auth::{LoginRequest, RegisterRequest, TokenResponse, User};
use crate::chat::{QueryAnswer, QueryRequest};
use crate::compare::{
    ComparisonRequest, ComparisonResult, MergeRequest, MergeResult, Relationship,
    RelationshipDraft,
};
use crate::error::Result;
use crate::project::{Project, ProjectDraft, ProjectFile};

#[async_trait]
pub trait AnalysisApi: Send + Sync {
    // Auth
    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse>;
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse>;
    async fn current_user(&self) -> Result<User>;

    // Quick analysis (no project)
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResult>;
    async fn analyze_upload(
        &self,
        upload_id: &str,
        user_intent: Option<&str>,
    ) -> Result<AnalysisResult>;

    // Projects
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn get_project(&self, project_id: i64) -> Result<Project>;
    async fn create_project(&self, draft: &ProjectDraft) -> Result<Project>;
    async fn update_project(&self, project_id: i64, draft: &ProjectDraft) -> Result<Project>;
    async fn delete_project(&self, project_id: i64) -> Result<()>;

    // Files and their analyses
    async fn list_files(&self, project_id: i64) -> Result<Vec<ProjectFile>>;
    async fn upload_project_file(
        &self,
        project_id: i64,
        file: &SelectedFile,
    ) -> Result<ProjectFile>;
    async fn delete_file(&self, project_id: i64, file_id: i64) -> Result<()>;
    async fn analyze_file(
        &self,
        project_id: i64,
        file_id: i64,
        request: &AnalyzeRequest,
    ) -> Result<AnalysisResult>;
    async fn list_analyses(&self, project_id: i64, file_id: i64)
    -> Result<Vec<PersistedAnalysis>>;
    async fn delete_analysis(&self, project_id: i64, file_id: i64, analysis_id: i64)
    -> Result<()>;

    // Comparison and merge
    async fn compare_files(
        &self,
        project_id: i64,
        request: &ComparisonRequest,
    ) -> Result<ComparisonResult>;
    async fn list_relationships(&self, project_id: i64) -> Result<Vec<Relationship>>;
    async fn create_relationship(
        &self,
        project_id: i64,
        draft: &RelationshipDraft,
    ) -> Result<Relationship>;
    async fn merge_analyze(&self, project_id: i64, request: &MergeRequest)
    -> Result<MergeResult>;

    // Conversation and on-demand insights
    async fn query(&self, request: &QueryRequest) -> Result<QueryAnswer>;
    async fn chart_insight(&self, request: &ChartInsightRequest) -> Result<ChartInsight>;
}
