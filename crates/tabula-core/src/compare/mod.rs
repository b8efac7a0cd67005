//! Comparison and merge domain module.

mod model;

pub use model::{
    common_columns, ComparisonRequest, ComparisonResult, ComparisonType, JoinType, MergeRequest,
    MergeResult, Relationship, RelationshipDraft,
};
