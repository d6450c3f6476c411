use chrono::{DateTime, Utc};
use serde_derive::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
pub struct WorkflowRunPage {
    pub workflow_runs: Vec<WorkflowRun>,
}

#[cfg(test)]
pub(crate) fn workflow_run(id: u64) -> WorkflowRun {
    WorkflowRun {
        id,
        name: Some("CI".to_string()),
        status: Some("queued".to_string()),
        created_at: None,
    }
}
