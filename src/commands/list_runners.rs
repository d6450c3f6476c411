use anyhow::{Context, Result};
use colored::*;
use itertools::Itertools;
use prettytable::{format, row, Table};

use crate::client::ActionsApi;
use crate::project::Repo;
use crate::runner::{Runner, RunnerStatus};

fn opt(s: Option<&str>) -> &str {
    s.unwrap_or("-")
}

pub fn runner_table(runners: &[Runner], dummy_runner: Option<&str>) -> Table {
    let mut table = Table::new();

    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["ID", "Name", "Status", "Busy", "OS", "Labels", "Cleanup"]);

    for r in runners.iter().sorted_by_key(|r| r.id) {
        let status = match r.status {
            RunnerStatus::Online => "online".green(),
            RunnerStatus::Offline => "offline".bright_red(),
            RunnerStatus::Unknown => "unknown".yellow(),
        };
        let cleanup = if r.is_dummy(dummy_runner) {
            "keep (dummy)".normal()
        } else if r.should_delete(dummy_runner) {
            "delete".bright_red()
        } else {
            "keep".normal()
        };
        let labels = r.labels.iter().map(|l| &l.name).join(", ");
        table.add_row(row![
            &r.id.to_string(),
            &r.name,
            &status,
            &r.busy.to_string(),
            opt(r.os.as_deref()),
            &labels,
            &cleanup,
        ]);
    }

    table
}

pub async fn list_runners<A>(api: &A, repo: &Repo, dummy_runner: Option<&str>) -> Result<()>
where
    A: ActionsApi + ?Sized,
{
    let runners = api
        .list_runners(repo)
        .await
        .with_context(|| format!("Failed to list self-hosted runners for {}", repo))?;

    runner_table(&runners, dummy_runner).printstd();

    Ok(())
}
