//! Project view: metadata, files, and the comparison and merge wizards.

use std::sync::Arc;

use tabula_core::analysis::{SelectedFile, validate_file};
use tabula_core::compare::{
    ComparisonRequest, ComparisonResult, MergeRequest, MergeResult, RelationshipDraft,
};
use tabula_core::config::UploadPolicy;
use tabula_core::project::{Project, ProjectDetail, ProjectDraft, ProjectFile};
use tabula_core::wizard::{
    ComparisonAnswers, MergeAnswers, Wizard, comparison_steps, merge_steps,
};
use tabula_core::{Result, TabulaError};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::cancel::run_cancellable;
use crate::data_service::DataService;

pub struct ProjectFlow {
    project_id: i64,
    data: Arc<DataService>,
    policy: UploadPolicy,
    comparison: Wizard<ComparisonAnswers>,
    merge: Wizard<MergeAnswers>,
    cancel: CancellationToken,
}

impl ProjectFlow {
    pub fn new(project_id: i64, data: Arc<DataService>, policy: UploadPolicy) -> Result<Self> {
        Ok(Self {
            project_id,
            data,
            policy,
            comparison: Wizard::new(comparison_steps(), ComparisonAnswers::default())?,
            merge: Wizard::new(merge_steps(), MergeAnswers::default())?,
            cancel: CancellationToken::new(),
        })
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn drop_guard(&self) -> DropGuard {
        self.cancel.clone().drop_guard()
    }

    /// Loads metadata and files concurrently.
    pub async fn load(&self) -> Result<ProjectDetail> {
        run_cancellable(&self.cancel, self.data.project_detail(self.project_id)).await
    }

    pub async fn update(&self, draft: &ProjectDraft) -> Result<Project> {
        validate_draft(draft)?;
        run_cancellable(&self.cancel, self.data.update_project(self.project_id, draft)).await
    }

    pub async fn delete(&self) -> Result<()> {
        run_cancellable(&self.cancel, self.data.delete_project(self.project_id)).await?;
        tracing::info!("Deleted project {}", self.project_id);
        Ok(())
    }

    /// Adds a file to the project without analyzing it.
    pub async fn upload_file(&self, file: &SelectedFile) -> Result<ProjectFile> {
        validate_file(file, &self.policy)?;
        run_cancellable(
            &self.cancel,
            self.data.upload_project_file(self.project_id, file),
        )
        .await
    }

    pub async fn delete_file(&self, file_id: i64) -> Result<()> {
        run_cancellable(&self.cancel, self.data.delete_file(self.project_id, file_id)).await
    }

    pub fn comparison_wizard(&self) -> &Wizard<ComparisonAnswers> {
        &self.comparison
    }

    pub fn merge_wizard(&self) -> &Wizard<MergeAnswers> {
        &self.merge
    }

    /// Finishes the comparison wizard. `Ok(None)` when the last step blocks.
    pub async fn run_comparison(&self) -> Result<Option<ComparisonResult>> {
        let data = self.data.clone();
        let project_id = self.project_id;

        let finish = self.comparison.finish(|answers| async move {
            let (file_a_id, file_b_id) = answers
                .files
                .ids()
                .ok_or_else(|| TabulaError::validation("Choose two different files"))?;
            let comparison_type = answers
                .comparison_type
                .ok_or_else(|| TabulaError::validation("Choose a comparison type"))?;

            tracing::info!(
                "Comparing files {} and {} ({}) in project {}",
                file_a_id,
                file_b_id,
                comparison_type,
                project_id
            );
            data.compare_files(
                project_id,
                &ComparisonRequest {
                    file_a_id,
                    file_b_id,
                    comparison_type,
                },
            )
            .await
        });

        run_cancellable(&self.cancel, finish).await
    }

    /// Finishes the merge wizard: defines the relationship, then merges over it.
    pub async fn run_merge(&self) -> Result<Option<MergeResult>> {
        let data = self.data.clone();
        let project_id = self.project_id;

        let finish = self.merge.finish(|answers| async move {
            let (file_a_id, file_b_id) = answers
                .files
                .ids()
                .ok_or_else(|| TabulaError::validation("Choose two different files"))?;
            let join_key = answers
                .join_key
                .clone()
                .filter(|_| answers.has_valid_join_key())
                .ok_or_else(|| TabulaError::validation("Choose a join key present in both files"))?;

            let relationship = data
                .create_relationship(
                    project_id,
                    &RelationshipDraft {
                        file_a_id,
                        file_b_id,
                        join_key,
                        join_type: answers.join_type,
                    },
                )
                .await?;
            tracing::info!(
                "Created relationship {} on '{}', merging",
                relationship.id,
                relationship.join_key
            );

            data.merge_analyze(
                project_id,
                &MergeRequest {
                    relationship_id: relationship.id,
                    user_intent: answers.user_intent.clone(),
                },
            )
            .await
        });

        run_cancellable(&self.cancel, finish).await
    }
}

/// Dashboard-level project operations.
pub async fn create_project(data: &DataService, draft: &ProjectDraft) -> Result<Project> {
    validate_draft(draft)?;
    let project = data.create_project(draft).await?;
    tracing::info!("Created project {} ({})", project.name, project.id);
    Ok(project)
}

fn validate_draft(draft: &ProjectDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(TabulaError::validation("Project name is required"));
    }
    Ok(())
}
