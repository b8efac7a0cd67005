//! Flow hooks: async drivers around the core state machines.
//!
//! Each flow owns a cancellation token. Once it fires, in-flight calls resolve
//! to `TabulaError::Cancelled`. An analysis flow that was busy returns to idle
//! with its file still selected; no error is recorded.

pub mod analysis;
pub mod auth;
pub mod chat;
pub mod project;

pub use analysis::{FileAnalysisFlow, QuickAnalysisFlow, StageCallback};
pub use auth::AuthFlow;
pub use chat::ChatFlow;
pub use project::{ProjectFlow, create_project};
