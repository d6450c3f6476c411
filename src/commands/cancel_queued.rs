use anyhow::{Context, Result};
use futures::future::join_all;
use itertools::Itertools;
use tracing::{error, info, warn};

use crate::client::ActionsApi;
use crate::commands::report::{Outcome, Report};
use crate::project::Repo;
use crate::workflow_run::WorkflowRun;

pub fn cancel_failure(message: &str, run_id: u64) -> String {
    format!("{} for {}", message, run_id)
}

async fn cancel_run<A>(api: &A, repo: &Repo, run: &WorkflowRun, dry_run: bool) -> (u64, Outcome)
where
    A: ActionsApi + ?Sized,
{
    let name = run.name.as_deref().unwrap_or("-");

    if dry_run {
        info!(run_id = run.id, run_name = name, "Would cancel workflow run: {}", run.id);
        return (run.id, Outcome::DryRun);
    }

    info!(
        run_id = run.id,
        run_name = name,
        status = run.status.as_deref().unwrap_or("-"),
        created_at = ?run.created_at,
        "Cancelling workflow run: {}", run.id
    );
    match api.cancel_run(repo, run.id).await {
        Ok(()) => {
            info!(run_id = run.id, "Workflow run: {} cancelled.", run.id);
            (run.id, Outcome::Done)
        }
        Err(e) => {
            let message = cancel_failure(&e.to_string(), run.id);
            error!(run_id = run.id, "{}", message);
            (run.id, Outcome::Failed(message))
        }
    }
}

/// Cancels every queued workflow run in the repository and waits for all
/// cancellations to settle.
pub async fn cancel_queued<A>(api: &A, repo: &Repo, dry_run: bool) -> Result<Report>
where
    A: ActionsApi + ?Sized,
{
    let runs = api
        .list_queued_runs(repo)
        .await
        .with_context(|| format!("Failed to list queued workflow runs for {}", repo))?;
    info!("Found {} queued workflow runs", runs.len());

    let outcomes = join_all(runs.iter().map(|run| cancel_run(api, repo, run, dry_run))).await;

    let report = Report {
        found: runs.len(),
        outcomes,
    };
    info!("Queued run cancellation finished: {}", report.summary("cancelled"));

    let failed = report.ids(|o| matches!(o, Outcome::Failed(_)));
    if !failed.is_empty() {
        warn!("Could not cancel workflow runs: {}", failed.iter().join(", "));
    }

    Ok(report)
}
