//! HttpApiClient - REST implementation of the analysis backend API.
//!
//! Every request carries the stored bearer token when one exists. A `401`
//! clears the token store so the route guard sends the user back to login.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tabula_core::analysis::{
    AnalysisResult, AnalyzeRequest, ChartInsight, ChartInsightRequest, PersistedAnalysis,
    SelectedFile, UploadResult,
};
use tabula_core::auth::{LoginRequest, RegisterRequest, TokenResponse, TokenStore, User};
use tabula_core::chat::{QueryAnswer, QueryRequest};
use tabula_core::compare::{
    ComparisonRequest, ComparisonResult, MergeRequest, MergeResult, Relationship,
    RelationshipDraft,
};
use tabula_core::config::ApiSettings;
use tabula_core::project::{Project, ProjectDraft, ProjectFile};
use tabula_core::{AnalysisApi, Result, TabulaError};

use crate::response::{decode, success_body, transport_error};

/// How long a call may take.
#[derive(Debug, Clone, Copy)]
enum Deadline {
    Default,
    /// Inference runs server-side (analysis, merge, chat).
    Analysis,
}

#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    analysis_timeout: Duration,
    token_store: Arc<dyn TokenStore>,
}

impl HttpApiClient {
    /// Creates a client for the backend described by `settings`.
    pub fn new(settings: &ApiSettings, token_store: Arc<dyn TokenStore>) -> Result<Self> {
        let base_url = settings.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(TabulaError::config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                settings.base_url
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("tabula/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TabulaError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout: Duration::from_secs(settings.timeout_secs),
            analysis_timeout: Duration::from_secs(settings.analysis_timeout_secs),
            token_store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path such as `/projects/3/files`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn request(&self, method: Method, path: &str, deadline: Deadline) -> RequestBuilder {
        let timeout = match deadline {
            Deadline::Default => self.timeout,
            Deadline::Analysis => self.analysis_timeout,
        };

        let mut request = self
            .client
            .request(method, self.endpoint_url(path))
            .timeout(timeout);

        match self.token_store.load().await {
            Ok(Some(token)) => {
                request = request.bearer_auth(token.access_token);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("Could not read stored token: {}", err),
        }

        request
    }

    /// Sends a prepared request and returns the body of a successful response.
    async fn execute(&self, endpoint: &str, request: RequestBuilder) -> Result<String> {
        tracing::debug!("-> {}", endpoint);

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        match success_body(endpoint, response).await {
            Err(TabulaError::Unauthorized) => {
                tracing::info!("{} answered 401, clearing stored token", endpoint);
                if let Err(err) = self.token_store.clear().await {
                    tracing::warn!("Failed to clear stored token: {}", err);
                }
                Err(TabulaError::Unauthorized)
            }
            other => other,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, deadline: Deadline) -> Result<T> {
        let endpoint = format!("GET {}", path);
        let request = self.request(Method::GET, path, deadline).await;
        let body = self.execute(&endpoint, request).await?;
        decode(&endpoint, &body)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B, deadline: Deadline) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let endpoint = format!("{} {}", method, path);
        let request = self.request(method, path, deadline).await.json(body);
        let body = self.execute(&endpoint, request).await?;
        decode(&endpoint, &body)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let endpoint = format!("DELETE {}", path);
        let request = self.request(Method::DELETE, path, Deadline::Default).await;
        self.execute(&endpoint, request).await.map(|_| ())
    }

    async fn upload_multipart<T: DeserializeOwned>(&self, path: &str, file: &SelectedFile) -> Result<T> {
        let endpoint = format!("POST {}", path);

        let part = Part::bytes(file.contents.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| TabulaError::validation(format!("Invalid content type '{}': {}", file.mime_type, e)))?;
        let form = Form::new().part("file", part);

        let request = self
            .request(Method::POST, path, Deadline::Analysis)
            .await
            .multipart(form);

        tracing::info!("Uploading {} ({} bytes) to {}", file.name, file.size, path);
        let body = self.execute(&endpoint, request).await?;
        decode(&endpoint, &body)
    }
}

#[async_trait]
impl AnalysisApi for HttpApiClient {
    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse> {
        self.send_json(Method::POST, "/auth/register", request, Deadline::Default)
            .await
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse> {
        self.send_json(Method::POST, "/auth/login", request, Deadline::Default)
            .await
    }

    async fn current_user(&self) -> Result<User> {
        self.get_json("/auth/me", Deadline::Default).await
    }

    async fn upload(&self, file: &SelectedFile) -> Result<UploadResult> {
        self.upload_multipart("/upload", file).await
    }

    async fn analyze_upload(&self, upload_id: &str, user_intent: Option<&str>) -> Result<AnalysisResult> {
        let path = format!("/analyze/{}", upload_id);
        let endpoint = format!("GET {}", path);

        let mut request = self.request(Method::GET, &path, Deadline::Analysis).await;
        if let Some(intent) = user_intent {
            request = request.query(&[("user_intent", intent)]);
        }

        let body = self.execute(&endpoint, request).await?;
        decode(&endpoint, &body)
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_json("/projects", Deadline::Default).await
    }

    async fn get_project(&self, project_id: i64) -> Result<Project> {
        self.get_json(&format!("/projects/{}", project_id), Deadline::Default)
            .await
    }

    async fn create_project(&self, draft: &ProjectDraft) -> Result<Project> {
        self.send_json(Method::POST, "/projects", draft, Deadline::Default)
            .await
    }

    async fn update_project(&self, project_id: i64, draft: &ProjectDraft) -> Result<Project> {
        let path = format!("/projects/{}", project_id);
        self.send_json(Method::PUT, &path, draft, Deadline::Default)
            .await
    }

    async fn delete_project(&self, project_id: i64) -> Result<()> {
        self.delete(&format!("/projects/{}", project_id)).await
    }

    async fn list_files(&self, project_id: i64) -> Result<Vec<ProjectFile>> {
        self.get_json(&format!("/projects/{}/files", project_id), Deadline::Default)
            .await
    }

    async fn upload_project_file(&self, project_id: i64, file: &SelectedFile) -> Result<ProjectFile> {
        self.upload_multipart(&format!("/projects/{}/files", project_id), file)
            .await
    }

    async fn delete_file(&self, project_id: i64, file_id: i64) -> Result<()> {
        self.delete(&format!("/projects/{}/files/{}", project_id, file_id))
            .await
    }

    async fn analyze_file(
        &self,
        project_id: i64,
        file_id: i64,
        request: &AnalyzeRequest,
    ) -> Result<AnalysisResult> {
        let path = format!("/projects/{}/files/{}/analyze", project_id, file_id);
        self.send_json(Method::POST, &path, request, Deadline::Analysis)
            .await
    }

    async fn list_analyses(&self, project_id: i64, file_id: i64) -> Result<Vec<PersistedAnalysis>> {
        let path = format!("/projects/{}/files/{}/analyses", project_id, file_id);
        self.get_json(&path, Deadline::Default).await
    }

    async fn delete_analysis(&self, project_id: i64, file_id: i64, analysis_id: i64) -> Result<()> {
        self.delete(&format!(
            "/projects/{}/files/{}/analyses/{}",
            project_id, file_id, analysis_id
        ))
        .await
    }

    async fn compare_files(&self, project_id: i64, request: &ComparisonRequest) -> Result<ComparisonResult> {
        let path = format!("/projects/{}/compare", project_id);
        self.send_json(Method::POST, &path, request, Deadline::Analysis)
            .await
    }

    async fn list_relationships(&self, project_id: i64) -> Result<Vec<Relationship>> {
        let path = format!("/projects/{}/relationships", project_id);
        self.get_json(&path, Deadline::Default).await
    }

    async fn create_relationship(&self, project_id: i64, draft: &RelationshipDraft) -> Result<Relationship> {
        let path = format!("/projects/{}/relationships", project_id);
        self.send_json(Method::POST, &path, draft, Deadline::Default)
            .await
    }

    async fn merge_analyze(&self, project_id: i64, request: &MergeRequest) -> Result<MergeResult> {
        let path = format!("/projects/{}/merge-analyze", project_id);
        self.send_json(Method::POST, &path, request, Deadline::Analysis)
            .await
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryAnswer> {
        self.send_json(Method::POST, "/query", request, Deadline::Analysis)
            .await
    }

    async fn chart_insight(&self, request: &ChartInsightRequest) -> Result<ChartInsight> {
        self.send_json(Method::POST, "/charts/insight", request, Deadline::Analysis)
            .await
    }
}
