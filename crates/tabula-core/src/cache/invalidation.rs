//! Which cached queries a successful mutation makes stale.

use super::key::QueryKey;

/// A write against the backend, with the path parameters that identify what it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateProject,
    UpdateProject { project_id: i64 },
    DeleteProject { project_id: i64 },
    UploadFile { project_id: i64 },
    DeleteFile { project_id: i64, file_id: i64 },
    AnalyzeFile { project_id: i64, file_id: i64, persisted: bool },
    DeleteAnalysis { project_id: i64, file_id: i64 },
    CompareFiles { project_id: i64 },
    CreateRelationship { project_id: i64 },
    MergeAnalyze { project_id: i64 },
    Logout,
}

/// Key prefixes to invalidate after `mutation` succeeds.
///
/// Pure: depends only on the mutation kind and its path parameters, never on a
/// response body.
pub fn invalidations(mutation: &Mutation) -> Vec<QueryKey> {
    match *mutation {
        Mutation::CreateProject => vec![QueryKey::projects()],
        Mutation::UpdateProject { project_id } => {
            vec![QueryKey::projects(), QueryKey::project(project_id)]
        }
        Mutation::DeleteProject { .. } => vec![QueryKey::projects()],
        Mutation::UploadFile { project_id } | Mutation::DeleteFile { project_id, .. } => {
            vec![
                QueryKey::project_files(project_id),
                QueryKey::project(project_id),
            ]
        }
        Mutation::AnalyzeFile {
            project_id,
            file_id,
            persisted,
        } => {
            let mut keys = vec![QueryKey::file_analysis(project_id, file_id)];
            if persisted {
                keys.push(QueryKey::file_analyses(project_id, file_id));
            }
            keys
        }
        Mutation::DeleteAnalysis {
            project_id,
            file_id,
        } => vec![
            QueryKey::file_analyses(project_id, file_id),
            QueryKey::file_analysis(project_id, file_id),
        ],
        Mutation::CompareFiles { project_id } => vec![QueryKey::project_comparisons(project_id)],
        Mutation::CreateRelationship { project_id } => {
            vec![QueryKey::project_relationships(project_id)]
        }
        Mutation::MergeAnalyze { project_id } => vec![
            QueryKey::project_files(project_id),
            QueryKey::project_relationships(project_id),
        ],
        Mutation::Logout => vec![QueryKey::root()],
    }
}
