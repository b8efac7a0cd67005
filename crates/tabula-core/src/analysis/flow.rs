//! Upload/analysis lifecycle.
//!
//! The transition table lives in [`AnalysisFlowState::apply`]; async drivers in
//! the application layer only feed it events. Keeping it pure lets the table be
//! tested without a network or a runtime.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::model::{AnalysisResult, UploadedDataset};
use super::upload::{validate_file, SelectedFile};
use crate::config::UploadPolicy;
use crate::error::{Result, TabulaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisStage {
    Idle,
    Uploading,
    /// Schema computation on the backend. No call of its own; narrated between upload and analysis.
    Processing,
    Analyzing,
    Complete,
    Error,
}

impl AnalysisStage {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Uploading | Self::Processing | Self::Analyzing)
    }
}

#[derive(Debug, Clone)]
pub enum FlowEvent {
    /// A validated file was admitted.
    FileSelected(SelectedFile),
    IntentChanged(Option<String>),
    UploadStarted,
    UploadSucceeded(UploadedDataset),
    /// Re-analysis of a file that already lives on the backend.
    Reanalyze(UploadedDataset),
    AnalysisStarted,
    AnalysisSucceeded(AnalysisResult),
    Failed(String),
    /// The in-flight call was abandoned. Returns to idle with the file still picked.
    Cancelled,
    Reset,
}

impl FlowEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::FileSelected(_) => "file_selected",
            Self::IntentChanged(_) => "intent_changed",
            Self::UploadStarted => "upload_started",
            Self::UploadSucceeded(_) => "upload_succeeded",
            Self::Reanalyze(_) => "reanalyze",
            Self::AnalysisStarted => "analysis_started",
            Self::AnalysisSucceeded(_) => "analysis_succeeded",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
            Self::Reset => "reset",
        }
    }
}

/// Client-side state of one upload → analyze run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFlowState {
    stage: AnalysisStage,
    selected_file: Option<SelectedFile>,
    user_intent: Option<String>,
    upload_result: Option<UploadedDataset>,
    analysis_result: Option<AnalysisResult>,
    /// Network or backend failure shown by the view.
    error: Option<String>,
    /// Local rejection of a picked file. Never set by a network call.
    validation_error: Option<String>,
}

impl Default for AnalysisFlowState {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisFlowState {
    pub fn new() -> Self {
        Self {
            stage: AnalysisStage::Idle,
            selected_file: None,
            user_intent: None,
            upload_result: None,
            analysis_result: None,
            error: None,
            validation_error: None,
        }
    }

    pub fn stage(&self) -> AnalysisStage {
        self.stage
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn user_intent(&self) -> Option<&str> {
        self.user_intent.as_deref()
    }

    pub fn upload_result(&self) -> Option<&UploadedDataset> {
        self.upload_result.as_ref()
    }

    /// Only `Some` once the stage is [`AnalysisStage::Complete`].
    pub fn analysis_result(&self) -> Option<&AnalysisResult> {
        self.analysis_result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    /// Validates `file` and admits it on success.
    ///
    /// A rejected file leaves the current selection untouched and records a
    /// validation error instead.
    pub fn select_file(&mut self, file: SelectedFile, policy: &UploadPolicy) -> Result<()> {
        if self.stage != AnalysisStage::Idle {
            return Err(TabulaError::transition(format!(
                "cannot select a file while {}",
                self.stage
            )));
        }

        match validate_file(&file, policy) {
            Ok(()) => self.apply(FlowEvent::FileSelected(file)),
            Err(err) => {
                self.validation_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Applies one event. Illegal events return an error and change nothing.
    pub fn apply(&mut self, event: FlowEvent) -> Result<()> {
        use AnalysisStage::*;

        let illegal = |stage: AnalysisStage, event: &FlowEvent| {
            Err(TabulaError::transition(format!(
                "event '{}' not allowed in stage '{}'",
                event.name(),
                stage
            )))
        };

        match (self.stage, event) {
            (_, FlowEvent::Reset) if !self.stage.is_busy() => {
                *self = Self::new();
            }
            (Idle, FlowEvent::FileSelected(file)) => {
                self.selected_file = Some(file);
                self.validation_error = None;
            }
            (Idle, FlowEvent::IntentChanged(intent)) => {
                self.user_intent = intent.filter(|i| !i.trim().is_empty());
            }
            (Idle, FlowEvent::UploadStarted) if self.selected_file.is_some() => {
                self.error = None;
                self.stage = Uploading;
            }
            (Uploading, FlowEvent::UploadSucceeded(dataset)) => {
                self.upload_result = Some(dataset);
                self.stage = Processing;
            }
            (Idle | Complete, FlowEvent::Reanalyze(dataset)) => {
                self.upload_result = Some(dataset);
                self.analysis_result = None;
                self.error = None;
                self.stage = Processing;
            }
            (Processing, FlowEvent::AnalysisStarted) => {
                self.stage = Analyzing;
            }
            (Analyzing, FlowEvent::AnalysisSucceeded(result)) => {
                self.analysis_result = Some(result);
                self.stage = Complete;
            }
            (Uploading | Processing | Analyzing, FlowEvent::Failed(message)) => {
                self.error = Some(message);
                self.stage = Error;
            }
            (Uploading | Processing | Analyzing, FlowEvent::Cancelled) => {
                self.upload_result = None;
                self.analysis_result = None;
                self.error = None;
                self.stage = Idle;
            }
            (stage, event) => return illegal(stage, &event),
        }

        Ok(())
    }
}
