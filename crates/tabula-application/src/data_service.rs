//! DataService - the request layer as the flows see it.
//!
//! Reads go through [`QueryCache`]; mutations call the backend once and, only
//! when the call succeeds, invalidate the prefixes named by [`invalidations`].

use std::sync::Arc;

use tabula_core::analysis::{
    AnalysisResult, AnalyzeRequest, ChartInsight, ChartInsightRequest, PersistedAnalysis,
    SelectedFile, UploadResult,
};
use tabula_core::auth::{LoginRequest, RegisterRequest, TokenResponse, User};
use tabula_core::cache::{Mutation, QueryKey, invalidations};
use tabula_core::chat::{QueryAnswer, QueryRequest};
use tabula_core::compare::{
    ComparisonRequest, ComparisonResult, MergeRequest, MergeResult, Relationship,
    RelationshipDraft,
};
use tabula_core::config::CacheSettings;
use tabula_core::project::{Project, ProjectDetail, ProjectDraft, ProjectFile};
use tabula_core::{AnalysisApi, Result};

use crate::query_cache::{FetchPolicy, QueryCache};

pub struct DataService {
    api: Arc<dyn AnalysisApi>,
    cache: Arc<QueryCache>,
    settings: CacheSettings,
}

impl DataService {
    pub fn new(api: Arc<dyn AnalysisApi>, settings: CacheSettings) -> Self {
        Self::with_cache(api, Arc::new(QueryCache::new()), settings)
    }

    pub fn with_cache(api: Arc<dyn AnalysisApi>, cache: Arc<QueryCache>, settings: CacheSettings) -> Self {
        Self { api, cache, settings }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    fn read_policy(&self) -> FetchPolicy {
        FetchPolicy::read(&self.settings)
    }

    /// Invalidates what `mutation` made stale.
    pub async fn invalidate(&self, mutation: &Mutation) {
        for prefix in invalidations(mutation) {
            self.cache.invalidate_prefix(&prefix).await;
        }
    }

    // ============================================================================
    // Auth
    // ============================================================================

    pub async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse> {
        self.api.register(request).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<TokenResponse> {
        self.api.login(request).await
    }

    pub async fn current_user(&self) -> Result<User> {
        self.cache
            .fetch(&QueryKey::me(), self.read_policy(), || self.api.current_user())
            .await
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.cache
            .fetch(&QueryKey::projects(), self.read_policy(), || self.api.list_projects())
            .await
    }

    pub async fn project(&self, project_id: i64) -> Result<Project> {
        self.cache
            .fetch(&QueryKey::project(project_id), self.read_policy(), || {
                self.api.get_project(project_id)
            })
            .await
    }

    pub async fn project_files(&self, project_id: i64) -> Result<Vec<ProjectFile>> {
        self.cache
            .fetch(&QueryKey::project_files(project_id), self.read_policy(), || {
                self.api.list_files(project_id)
            })
            .await
    }

    /// Project metadata and its files, fetched concurrently.
    pub async fn project_detail(&self, project_id: i64) -> Result<ProjectDetail> {
        let (project, files) =
            futures::try_join!(self.project(project_id), self.project_files(project_id))?;
        Ok(ProjectDetail { project, files })
    }

    pub async fn file_analyses(&self, project_id: i64, file_id: i64) -> Result<Vec<PersistedAnalysis>> {
        self.cache
            .fetch(
                &QueryKey::file_analyses(project_id, file_id),
                self.read_policy(),
                || self.api.list_analyses(project_id, file_id),
            )
            .await
    }

    pub async fn relationships(&self, project_id: i64) -> Result<Vec<Relationship>> {
        self.cache
            .fetch(
                &QueryKey::project_relationships(project_id),
                self.read_policy(),
                || self.api.list_relationships(project_id),
            )
            .await
    }

    /// Analysis of an ephemeral upload. Cached per intent, never retried.
    pub async fn upload_analysis(&self, upload_id: &str, user_intent: Option<&str>) -> Result<AnalysisResult> {
        let mut key = QueryKey::upload_analysis(upload_id);
        if let Some(intent) = user_intent {
            key = key.child(intent);
        }

        self.cache
            .fetch(&key, FetchPolicy::single_attempt(&self.settings), || {
                self.api.analyze_upload(upload_id, user_intent)
            })
            .await
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    pub async fn upload(&self, file: &SelectedFile) -> Result<UploadResult> {
        self.api.upload(file).await
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project> {
        let project = self.api.create_project(draft).await?;
        self.invalidate(&Mutation::CreateProject).await;
        Ok(project)
    }

    pub async fn update_project(&self, project_id: i64, draft: &ProjectDraft) -> Result<Project> {
        let project = self.api.update_project(project_id, draft).await?;
        self.invalidate(&Mutation::UpdateProject { project_id }).await;
        Ok(project)
    }

    pub async fn delete_project(&self, project_id: i64) -> Result<()> {
        self.api.delete_project(project_id).await?;
        self.invalidate(&Mutation::DeleteProject { project_id }).await;
        Ok(())
    }

    pub async fn upload_project_file(&self, project_id: i64, file: &SelectedFile) -> Result<ProjectFile> {
        let stored = self.api.upload_project_file(project_id, file).await?;
        self.invalidate(&Mutation::UploadFile { project_id }).await;
        Ok(stored)
    }

    pub async fn delete_file(&self, project_id: i64, file_id: i64) -> Result<()> {
        self.api.delete_file(project_id, file_id).await?;
        self.invalidate(&Mutation::DeleteFile { project_id, file_id })
            .await;
        Ok(())
    }

    pub async fn analyze_file(
        &self,
        project_id: i64,
        file_id: i64,
        request: &AnalyzeRequest,
    ) -> Result<AnalysisResult> {
        let result = self.api.analyze_file(project_id, file_id, request).await?;
        self.invalidate(&Mutation::AnalyzeFile {
            project_id,
            file_id,
            persisted: request.persist,
        })
        .await;
        Ok(result)
    }

    pub async fn delete_analysis(&self, project_id: i64, file_id: i64, analysis_id: i64) -> Result<()> {
        self.api
            .delete_analysis(project_id, file_id, analysis_id)
            .await?;
        self.invalidate(&Mutation::DeleteAnalysis { project_id, file_id })
            .await;
        Ok(())
    }

    pub async fn compare_files(&self, project_id: i64, request: &ComparisonRequest) -> Result<ComparisonResult> {
        let result = self.api.compare_files(project_id, request).await?;
        self.invalidate(&Mutation::CompareFiles { project_id }).await;
        Ok(result)
    }

    pub async fn create_relationship(&self, project_id: i64, draft: &RelationshipDraft) -> Result<Relationship> {
        let relationship = self.api.create_relationship(project_id, draft).await?;
        self.invalidate(&Mutation::CreateRelationship { project_id })
            .await;
        Ok(relationship)
    }

    pub async fn merge_analyze(&self, project_id: i64, request: &MergeRequest) -> Result<MergeResult> {
        let result = self.api.merge_analyze(project_id, request).await?;
        self.invalidate(&Mutation::MergeAnalyze { project_id }).await;
        Ok(result)
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryAnswer> {
        self.api.query(request).await
    }

    pub async fn chart_insight(&self, request: &ChartInsightRequest) -> Result<ChartInsight> {
        self.api.chart_insight(request).await
    }
}
