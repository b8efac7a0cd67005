//! Wizard domain module.
//!
//! - `machine`: The comparison/merge-agnostic wizard (`Wizard`, `WizardStep`)
//! - `steps`: Step lists and answers for the comparison and merge wizards

mod machine;
mod steps;

pub use machine::{Navigation, PredicateValidator, StepValidator, Wizard, WizardStep};
pub use steps::{
    comparison_steps, merge_steps, ComparisonAnswers, FilePair, MergeAnswers,
    STEP_COMPARISON_TYPE, STEP_CONFIGURE, STEP_REVIEW, STEP_SELECT_FILES,
};
