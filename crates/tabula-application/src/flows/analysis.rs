//! Upload → analyze flows.
//!
//! Both variants drive the same [`AnalysisFlowState`] machine and publish every
//! change through a `watch` channel. Only the backend calls differ.

use std::sync::Arc;

use tabula_core::analysis::{
    AnalysisFlowState, AnalysisResult, AnalysisStage, AnalyzeRequest, Chart, ChartInsightRequest,
    FlowEvent, SelectedFile,
};
use tabula_core::config::UploadPolicy;
use tabula_core::project::ProjectFile;
use tabula_core::{Result, TabulaError};
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::cancel::run_cancellable;
use crate::data_service::DataService;

pub const UPLOAD_FAILED: &str = "Failed to upload file";
pub const ANALYZE_FAILED: &str = "Failed to analyze file";

/// Invoked with each stage the flow enters.
pub type StageCallback = Arc<dyn Fn(AnalysisStage) + Send + Sync>;

/// State, cancellation and notification shared by both flow variants.
struct FlowDriver {
    state: watch::Sender<AnalysisFlowState>,
    policy: UploadPolicy,
    cancel: CancellationToken,
    on_stage: Option<StageCallback>,
}

impl FlowDriver {
    fn new(policy: UploadPolicy) -> Self {
        let (state, _) = watch::channel(AnalysisFlowState::new());
        Self {
            state,
            policy,
            cancel: CancellationToken::new(),
            on_stage: None,
        }
    }

    fn snapshot(&self) -> AnalysisFlowState {
        self.state.borrow().clone()
    }

    fn select_file(&self, file: SelectedFile) -> Result<()> {
        let mut outcome = Ok(());
        self.state.send_modify(|state| {
            outcome = state.select_file(file, &self.policy);
        });
        if let Err(err) = &outcome {
            tracing::info!("Rejected file: {}", err);
        }
        outcome
    }

    fn apply(&self, event: FlowEvent) -> Result<()> {
        let mut outcome = Ok(());
        let mut entered = None;

        self.state.send_if_modified(|state| {
            let before = state.stage();
            match state.apply(event) {
                Ok(()) => {
                    if state.stage() != before {
                        entered = Some(state.stage());
                    }
                    true
                }
                Err(err) => {
                    outcome = Err(err);
                    false
                }
            }
        });

        if let Some(stage) = entered {
            tracing::debug!("analysis flow entered {}", stage);
            if let Some(callback) = &self.on_stage {
                callback(stage);
            }
        }
        outcome
    }

    /// Records a failed call. A cancelled call drops back to idle instead of
    /// reporting an error.
    fn fail(&self, err: TabulaError, fallback: &str) -> TabulaError {
        if err.is_cancelled() {
            tracing::debug!("analysis flow cancelled");
            if let Err(transition) = self.apply(FlowEvent::Cancelled) {
                tracing::warn!("could not record cancellation: {}", transition);
            }
            return err;
        }

        let message = err.user_message(fallback);
        tracing::warn!("analysis flow failed: {}", message);
        if let Err(transition) = self.apply(FlowEvent::Failed(message)) {
            tracing::warn!("could not record failure: {}", transition);
        }
        err
    }

    fn require_file(&self) -> Result<SelectedFile> {
        self.snapshot()
            .selected_file()
            .cloned()
            .ok_or_else(|| TabulaError::validation("Select a file to analyze first"))
    }
}

macro_rules! flow_common {
    () => {
        pub fn with_stage_callback(mut self, callback: StageCallback) -> Self {
            self.driver.on_stage = Some(callback);
            self
        }

        pub fn state(&self) -> AnalysisFlowState {
            self.driver.snapshot()
        }

        pub fn subscribe(&self) -> watch::Receiver<AnalysisFlowState> {
            self.driver.state.subscribe()
        }

        /// Validates and admits `file`. No network call is made.
        pub fn select_file(&self, file: SelectedFile) -> Result<()> {
            self.driver.select_file(file)
        }

        pub fn set_intent(&self, user_intent: Option<String>) -> Result<()> {
            self.driver.apply(FlowEvent::IntentChanged(user_intent))
        }

        /// Starts a new analysis. Refused while a call is in flight.
        pub fn reset(&self) -> Result<()> {
            self.driver.apply(FlowEvent::Reset)
        }

        pub fn cancel(&self) {
            self.driver.cancel.cancel();
        }

        pub fn cancellation_token(&self) -> CancellationToken {
            self.driver.cancel.clone()
        }

        /// Cancels the flow when dropped.
        pub fn drop_guard(&self) -> DropGuard {
            self.driver.cancel.clone().drop_guard()
        }
    };
}

/// Analysis of a file that is not part of any project.
pub struct QuickAnalysisFlow {
    data: Arc<DataService>,
    driver: FlowDriver,
}

impl QuickAnalysisFlow {
    pub fn new(data: Arc<DataService>, policy: UploadPolicy) -> Self {
        Self {
            data,
            driver: FlowDriver::new(policy),
        }
    }

    flow_common!();

    /// Uploads the selected file and analyzes it.
    pub async fn run(&self) -> Result<AnalysisResult> {
        let file = self.driver.require_file()?;
        self.driver.apply(FlowEvent::UploadStarted)?;
        tracing::info!("Uploading {} for quick analysis", file.name);

        let upload = match run_cancellable(&self.driver.cancel, self.data.upload(&file)).await {
            Ok(upload) => upload,
            Err(err) => return Err(self.driver.fail(err, UPLOAD_FAILED)),
        };
        let upload_id = upload.upload_id.clone();
        self.driver.apply(FlowEvent::UploadSucceeded(upload.into()))?;

        self.driver.apply(FlowEvent::AnalysisStarted)?;
        let intent = self.driver.snapshot().user_intent().map(str::to_string);
        let analysis = self.data.upload_analysis(&upload_id, intent.as_deref());

        match run_cancellable(&self.driver.cancel, analysis).await {
            Ok(result) => {
                self.driver
                    .apply(FlowEvent::AnalysisSucceeded(result.clone()))?;
                tracing::info!("Quick analysis of {} complete", file.name);
                Ok(result)
            }
            Err(err) => Err(self.driver.fail(err, ANALYZE_FAILED)),
        }
    }
}

/// Analysis of a file stored in a project.
pub struct FileAnalysisFlow {
    project_id: i64,
    data: Arc<DataService>,
    driver: FlowDriver,
}

impl FileAnalysisFlow {
    pub fn new(project_id: i64, data: Arc<DataService>, policy: UploadPolicy) -> Self {
        Self {
            project_id,
            data,
            driver: FlowDriver::new(policy),
        }
    }

    flow_common!();

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    /// Adds the selected file to the project, then analyzes it.
    pub async fn run(&self) -> Result<(ProjectFile, AnalysisResult)> {
        let file = self.driver.require_file()?;
        self.driver.apply(FlowEvent::UploadStarted)?;
        tracing::info!("Uploading {} to project {}", file.name, self.project_id);

        let upload = self.data.upload_project_file(self.project_id, &file);
        let stored = match run_cancellable(&self.driver.cancel, upload).await {
            Ok(stored) => stored,
            Err(err) => return Err(self.driver.fail(err, UPLOAD_FAILED)),
        };
        self.driver
            .apply(FlowEvent::UploadSucceeded(stored.clone().into()))?;

        let result = self.analyze(stored.id).await?;
        Ok((stored, result))
    }

    /// Analyzes an already uploaded file again with a new intent.
    pub async fn reanalyze(&self, file: &ProjectFile, user_intent: Option<String>) -> Result<AnalysisResult> {
        if matches!(
            self.driver.snapshot().stage(),
            AnalysisStage::Complete | AnalysisStage::Error
        ) {
            self.driver.apply(FlowEvent::Reset)?;
        }
        self.driver.apply(FlowEvent::IntentChanged(user_intent))?;
        self.driver
            .apply(FlowEvent::Reanalyze(file.clone().into()))?;
        tracing::info!("Re-analyzing {} in project {}", file.filename, self.project_id);

        self.analyze(file.id).await
    }

    /// Asks the backend to explain one chart. Leaves the stage untouched.
    pub async fn chart_insight(&self, chart: &Chart, file_id: Option<i64>) -> Result<String> {
        let request = ChartInsightRequest {
            chart: chart.clone(),
            file_id,
            user_intent: self.driver.snapshot().user_intent().map(str::to_string),
        };
        let insight = run_cancellable(&self.driver.cancel, self.data.chart_insight(&request)).await?;
        Ok(insight.insight)
    }

    async fn analyze(&self, file_id: i64) -> Result<AnalysisResult> {
        self.driver.apply(FlowEvent::AnalysisStarted)?;

        let request = AnalyzeRequest {
            user_intent: self.driver.snapshot().user_intent().map(str::to_string),
            persist: true,
        };
        let analysis = self.data.analyze_file(self.project_id, file_id, &request);

        match run_cancellable(&self.driver.cancel, analysis).await {
            Ok(result) => {
                self.driver
                    .apply(FlowEvent::AnalysisSucceeded(result.clone()))?;
                Ok(result)
            }
            Err(err) => Err(self.driver.fail(err, ANALYZE_FAILED)),
        }
    }
}
