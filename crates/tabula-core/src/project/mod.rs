//! Project domain records.

mod model;

pub use model::{Project, ProjectDetail, ProjectDraft, ProjectFile};
