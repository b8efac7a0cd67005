//! Step lists for the comparison and merge wizards.

use crate::compare::{common_columns, ComparisonType, JoinType};
use crate::project::ProjectFile;

use super::machine::WizardStep;

pub const STEP_SELECT_FILES: &str = "select_files";
pub const STEP_COMPARISON_TYPE: &str = "comparison_type";
pub const STEP_CONFIGURE: &str = "configure";
pub const STEP_REVIEW: &str = "review";

/// Two distinct files picked from the same project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePair {
    pub file_a: Option<ProjectFile>,
    pub file_b: Option<ProjectFile>,
}

impl FilePair {
    pub fn is_complete(&self) -> bool {
        match (&self.file_a, &self.file_b) {
            (Some(a), Some(b)) => a.id != b.id,
            _ => false,
        }
    }

    pub fn ids(&self) -> Option<(i64, i64)> {
        match (&self.file_a, &self.file_b) {
            (Some(a), Some(b)) if a.id != b.id => Some((a.id, b.id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonAnswers {
    pub files: FilePair,
    pub comparison_type: Option<ComparisonType>,
}

/// Select files → comparison type → review.
pub fn comparison_steps() -> Vec<WizardStep<ComparisonAnswers>> {
    vec![
        WizardStep::new(STEP_SELECT_FILES, "Select files")
            .with_check(|a: &ComparisonAnswers| a.files.is_complete()),
        WizardStep::new(STEP_COMPARISON_TYPE, "Comparison type")
            .with_check(|a: &ComparisonAnswers| a.comparison_type.is_some()),
        WizardStep::new(STEP_REVIEW, "Review")
            .with_check(|a: &ComparisonAnswers| a.files.is_complete() && a.comparison_type.is_some()),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeAnswers {
    pub files: FilePair,
    pub join_key: Option<String>,
    pub join_type: JoinType,
    pub user_intent: Option<String>,
}

impl MergeAnswers {
    /// Columns offered by the join-key selector: those present in both files.
    pub fn selectable_join_keys(&self) -> Vec<String> {
        match (&self.files.file_a, &self.files.file_b) {
            (Some(a), Some(b)) => common_columns(&a.columns, &b.columns),
            _ => Vec::new(),
        }
    }

    pub fn set_file_a(&mut self, file: ProjectFile) {
        self.files.file_a = Some(file);
        self.drop_stale_join_key();
    }

    pub fn set_file_b(&mut self, file: ProjectFile) {
        self.files.file_b = Some(file);
        self.drop_stale_join_key();
    }

    fn drop_stale_join_key(&mut self) {
        if let Some(key) = &self.join_key
            && !self.selectable_join_keys().contains(key)
        {
            self.join_key = None;
        }
    }

    pub fn has_valid_join_key(&self) -> bool {
        self.join_key
            .as_ref()
            .is_some_and(|key| self.selectable_join_keys().contains(key))
    }
}

/// Select files → join key/type → review.
pub fn merge_steps() -> Vec<WizardStep<MergeAnswers>> {
    vec![
        WizardStep::new(STEP_SELECT_FILES, "Select files")
            .with_check(|a: &MergeAnswers| a.files.is_complete()),
        WizardStep::new(STEP_CONFIGURE, "Join configuration")
            .with_check(|a: &MergeAnswers| a.has_valid_join_key()),
        WizardStep::new(STEP_REVIEW, "Review")
            .with_check(|a: &MergeAnswers| a.files.is_complete() && a.has_valid_join_key()),
    ]
}
