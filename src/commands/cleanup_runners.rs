use anyhow::{Context, Result};
use futures::future::join_all;
use itertools::Itertools;
use tracing::{error, info, warn};

use crate::client::ActionsApi;
use crate::commands::report::{Outcome, Report};
use crate::project::Repo;
use crate::runner::Runner;

pub fn runners_found(count: usize, repo: &Repo) -> String {
    format!("{} runners found for {}", count, repo)
}

async fn cleanup_runner<A>(
    api: &A,
    repo: &Repo,
    runner: &Runner,
    dummy_runner: Option<&str>,
    dry_run: bool,
) -> (u64, Outcome)
where
    A: ActionsApi + ?Sized,
{
    if !runner.should_delete(dummy_runner) {
        info!(
            runner_id = runner.id,
            "Runner {} is either online or a dummy runner, skipping", runner.name
        );
        return (runner.id, Outcome::Skipped);
    }

    if dry_run {
        info!(
            runner_id = runner.id,
            status = %runner.status,
            "Would delete runner {}", runner.name
        );
        return (runner.id, Outcome::DryRun);
    }

    match api.delete_runner(repo, runner.id).await {
        Ok(()) => {
            info!(runner_id = runner.id, status = %runner.status, "Deleted runner {}", runner.name);
            (runner.id, Outcome::Done)
        }
        Err(e) => {
            error!(
                runner_id = runner.id,
                status = %runner.status,
                name = %runner.name,
                "Failed to delete runner: {}", e
            );
            (runner.id, Outcome::Failed(e.to_string()))
        }
    }
}

/// Deletes every runner that is not online and is not the dummy runner.
///
/// Deletions run concurrently and are all awaited. A failed deletion is logged
/// and recorded in the report; it never stops the others.
pub async fn cleanup_runners<A>(
    api: &A,
    repo: &Repo,
    dummy_runner: Option<&str>,
    dry_run: bool,
) -> Result<Report>
where
    A: ActionsApi + ?Sized,
{
    let runners = api
        .list_runners(repo)
        .await
        .with_context(|| format!("Failed to list self-hosted runners for {}", repo))?;
    info!("{}", runners_found(runners.len(), repo));

    let actions = runners
        .iter()
        .map(|r| cleanup_runner(api, repo, r, dummy_runner, dry_run));
    let outcomes = join_all(actions).await;

    let report = Report {
        found: runners.len(),
        outcomes,
    };
    info!("Runner cleanup finished: {}", report.summary("deleted"));

    let failed = report.ids(|o| matches!(o, Outcome::Failed(_)));
    if !failed.is_empty() {
        warn!("Could not delete runners: {}", failed.iter().join(", "));
    }

    Ok(report)
}
