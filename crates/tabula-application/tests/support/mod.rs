//! In-memory `AnalysisApi` for flow tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tabula_core::analysis::{
    AnalysisResult, AnalyzeRequest, Chart, ChartInsight, ChartInsightRequest, ChartType,
    PersistedAnalysis, SelectedFile, UploadResult,
};
use tabula_core::auth::{LoginRequest, RegisterRequest, TokenResponse, User};
use tabula_core::chat::{QueryAnswer, QueryRequest};
use tabula_core::compare::{
    ComparisonRequest, ComparisonResult, MergeRequest, MergeResult, Relationship,
    RelationshipDraft,
};
use tabula_core::project::{Project, ProjectDraft, ProjectFile};
use tabula_core::{AnalysisApi, Result, TabulaError};

/// Records every call by name and answers from canned data.
#[derive(Default)]
pub struct FakeApi {
    pub calls: Mutex<Vec<String>>,
    pub upload_error: Mutex<Option<TabulaError>>,
    pub analyze_error: Mutex<Option<TabulaError>>,
    pub create_project_error: Mutex<Option<TabulaError>>,
    pub query_results: Mutex<VecDeque<Result<QueryAnswer>>>,
    pub query_requests: Mutex<Vec<QueryRequest>>,
    pub files: Mutex<Vec<ProjectFile>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_upload(&self, err: TabulaError) {
        *self.upload_error.lock().unwrap() = Some(err);
    }

    pub fn fail_analyze(&self, err: TabulaError) {
        *self.analyze_error.lock().unwrap() = Some(err);
    }

    pub fn fail_create_project(&self, err: TabulaError) {
        *self.create_project_error.lock().unwrap() = Some(err);
    }

    pub fn push_query_result(&self, result: Result<QueryAnswer>) {
        self.query_results.lock().unwrap().push_back(result);
    }

    pub fn set_files(&self, files: Vec<ProjectFile>) {
        *self.files.lock().unwrap() = files;
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn take(slot: &Mutex<Option<TabulaError>>) -> Option<TabulaError> {
        slot.lock().unwrap().take()
    }
}

pub fn project_file(id: i64, columns: &[&str]) -> ProjectFile {
    ProjectFile {
        id,
        project_id: Some(1),
        filename: format!("file-{}.csv", id),
        row_count: 10,
        column_count: columns.len() as u32,
        columns: columns.iter().map(|c| c.to_string()).collect(),
        file_size: Some(1024),
        uploaded_at: None,
    }
}

pub fn csv_file(name: &str, size: usize) -> SelectedFile {
    SelectedFile::new(name, Some("text/csv".into()), vec![b'a'; size])
}

pub fn chart() -> Chart {
    Chart {
        id: "c1".into(),
        title: "Revenue by month".into(),
        chart_type: ChartType::Bar,
        spec: serde_json::json!({"x": "month", "y": "revenue"}),
        insight: None,
    }
}

fn empty<T: DeserializeOwned>() -> T {
    serde_json::from_str("{}").unwrap()
}

fn analysis() -> AnalysisResult {
    AnalysisResult {
        charts: vec![chart()],
        ..AnalysisResult::default()
    }
}

#[async_trait]
impl AnalysisApi for FakeApi {
    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse> {
        self.record("register");
        Ok(TokenResponse {
            access_token: "registered-token".into(),
            token_type: "bearer".into(),
            user: Some(User {
                id: 2,
                email: request.email.clone(),
                name: request.name.clone(),
            }),
        })
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse> {
        self.record("login");
        if request.password != "correct horse" {
            return Err(TabulaError::http(401, "Invalid credentials"));
        }
        Ok(TokenResponse {
            access_token: "login-token".into(),
            token_type: "bearer".into(),
            user: None,
        })
    }

    async fn current_user(&self) -> Result<User> {
        self.record("current_user");
        Ok(User {
            id: 1,
            email: "ana@example.com".into(),
            name: Some("Ana".into()),
        })
    }

    async fn upload(&self, file: &SelectedFile) -> Result<UploadResult> {
        self.record("upload");
        if let Some(err) = Self::take(&self.upload_error) {
            return Err(err);
        }
        Ok(UploadResult {
            upload_id: "up-1".into(),
            filename: file.name.clone(),
            rows: 100,
            columns: 2,
            column_names: vec!["month".into(), "revenue".into()],
            preview: Vec::new(),
        })
    }

    async fn analyze_upload(&self, upload_id: &str, _user_intent: Option<&str>) -> Result<AnalysisResult> {
        self.record(format!("analyze_upload:{}", upload_id));
        if let Some(err) = Self::take(&self.analyze_error) {
            return Err(err);
        }
        Ok(analysis())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.record("list_projects");
        Ok(vec![Project {
            id: 1,
            name: "Sales".into(),
            description: None,
            file_count: self.files.lock().unwrap().len() as u32,
            created_at: None,
            updated_at: None,
        }])
    }

    async fn get_project(&self, project_id: i64) -> Result<Project> {
        self.record(format!("get_project:{}", project_id));
        Ok(Project {
            id: project_id,
            name: "Sales".into(),
            description: Some("Monthly exports".into()),
            file_count: self.files.lock().unwrap().len() as u32,
            created_at: None,
            updated_at: None,
        })
    }

    async fn create_project(&self, draft: &ProjectDraft) -> Result<Project> {
        self.record("create_project");
        if let Some(err) = Self::take(&self.create_project_error) {
            return Err(err);
        }
        Ok(Project {
            id: 9,
            name: draft.name.clone(),
            description: draft.description.clone(),
            file_count: 0,
            created_at: None,
            updated_at: None,
        })
    }

    async fn update_project(&self, project_id: i64, draft: &ProjectDraft) -> Result<Project> {
        self.record(format!("update_project:{}", project_id));
        Ok(Project {
            id: project_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            file_count: 0,
            created_at: None,
            updated_at: None,
        })
    }

    async fn delete_project(&self, project_id: i64) -> Result<()> {
        self.record(format!("delete_project:{}", project_id));
        Ok(())
    }

    async fn list_files(&self, project_id: i64) -> Result<Vec<ProjectFile>> {
        self.record(format!("list_files:{}", project_id));
        Ok(self.files.lock().unwrap().clone())
    }

    async fn upload_project_file(&self, project_id: i64, file: &SelectedFile) -> Result<ProjectFile> {
        self.record(format!("upload_project_file:{}", project_id));
        if let Some(err) = Self::take(&self.upload_error) {
            return Err(err);
        }
        let mut stored = project_file(21, &["month", "revenue"]);
        stored.project_id = Some(project_id);
        stored.filename = file.name.clone();
        self.files.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn delete_file(&self, project_id: i64, file_id: i64) -> Result<()> {
        self.record(format!("delete_file:{}:{}", project_id, file_id));
        self.files.lock().unwrap().retain(|f| f.id != file_id);
        Ok(())
    }

    async fn analyze_file(
        &self,
        project_id: i64,
        file_id: i64,
        request: &AnalyzeRequest,
    ) -> Result<AnalysisResult> {
        self.record(format!(
            "analyze_file:{}:{}:{}",
            project_id,
            file_id,
            request.user_intent.clone().unwrap_or_default()
        ));
        if let Some(err) = Self::take(&self.analyze_error) {
            return Err(err);
        }
        Ok(AnalysisResult {
            analysis_id: Some(5),
            ..analysis()
        })
    }

    async fn list_analyses(&self, project_id: i64, file_id: i64) -> Result<Vec<PersistedAnalysis>> {
        self.record(format!("list_analyses:{}:{}", project_id, file_id));
        Ok(Vec::new())
    }

    async fn delete_analysis(&self, project_id: i64, file_id: i64, analysis_id: i64) -> Result<()> {
        self.record(format!("delete_analysis:{}:{}:{}", project_id, file_id, analysis_id));
        Ok(())
    }

    async fn compare_files(&self, project_id: i64, request: &ComparisonRequest) -> Result<ComparisonResult> {
        self.record(format!(
            "compare_files:{}:{}:{}:{}",
            project_id, request.file_a_id, request.file_b_id, request.comparison_type
        ));
        Ok(ComparisonResult {
            summary: "Schemas overlap on 1 column".into(),
            ..empty()
        })
    }

    async fn list_relationships(&self, project_id: i64) -> Result<Vec<Relationship>> {
        self.record(format!("list_relationships:{}", project_id));
        Ok(Vec::new())
    }

    async fn create_relationship(&self, project_id: i64, draft: &RelationshipDraft) -> Result<Relationship> {
        self.record(format!("create_relationship:{}:{}", project_id, draft.join_key));
        Ok(Relationship {
            id: 77,
            file_a_id: draft.file_a_id,
            file_b_id: draft.file_b_id,
            join_key: draft.join_key.clone(),
            join_type: draft.join_type,
        })
    }

    async fn merge_analyze(&self, project_id: i64, request: &MergeRequest) -> Result<MergeResult> {
        self.record(format!("merge_analyze:{}:{}", project_id, request.relationship_id));
        Ok(MergeResult {
            row_count: 42,
            ..empty()
        })
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryAnswer> {
        self.record("query");
        self.query_requests.lock().unwrap().push(request.clone());
        self.query_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TabulaError::internal("no canned answer")))
    }

    async fn chart_insight(&self, request: &ChartInsightRequest) -> Result<ChartInsight> {
        self.record("chart_insight");
        Ok(ChartInsight {
            insight: format!("{} peaks in December", request.chart.title),
        })
    }
}
