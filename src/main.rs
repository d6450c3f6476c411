use std::path::Path;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands {
    pub mod cancel_queued;
    pub mod cleanup_runners;
    pub mod list_runners;
    pub mod report;
}
mod client;
mod credentials;
mod error;
mod project;
mod runner;
#[cfg(test)]
mod test_support;
mod throttle;
mod workflow_run;

use client::{GitHubClient, DEFAULT_API_URL};
use commands::cancel_queued::cancel_queued;
use commands::cleanup_runners::cleanup_runners;
use commands::list_runners::list_runners;
use credentials::{is_ci, load_inputs, process_env};
use project::resolve_repo;

#[derive(Parser, Debug)]
#[command(
    name = "runner-janitor",
    about = "Removes stale self-hosted runners and cancels queued workflow runs"
)]
struct Opt {
    /// Repository as owner/repo
    #[arg(short = 'R', long = "repo", env = "GITHUB_REPOSITORY", global = true)]
    repo: Option<String>,

    /// GitHub API base URL
    #[arg(
        long = "api-url",
        env = "GITHUB_API_URL",
        default_value = DEFAULT_API_URL,
        global = true
    )]
    api_url: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete offline self-hosted runners, keeping the dummy runner
    #[command(name = "cleanup-runners")]
    CleanupRunners {
        /// Log what would be deleted without deleting anything
        #[arg(long = "dry-run")]
        dry_run: bool,
    },

    /// Cancel every workflow run that is still queued
    #[command(name = "cancel-queued")]
    CancelQueued {
        /// Log what would be cancelled without cancelling anything
        #[arg(long = "dry-run")]
        dry_run: bool,
    },

    /// List self-hosted runners and whether cleanup would delete them
    #[command(name = "list-runners")]
    ListRunners {},
}

fn init_tracing(ci: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!ci)
        .init();
}

/// Loads a `.env` file without overriding variables that are already set,
/// then reports whether we are running under CI.
fn load_environment(dotenv_path: Option<&Path>) -> bool {
    match dotenv_path {
        Some(path) => dotenvy::from_path(path).ok(),
        None => dotenvy::dotenv().ok().map(|_| ()),
    };
    is_ci(&process_env)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let ci = load_environment(None);
    init_tracing(ci);

    let opt = Opt::parse();
    debug!("{:?}", opt.cmd);

    let inputs = load_inputs()?;
    let repo = resolve_repo(opt.repo.as_deref())?;
    let dummy_runner = inputs.dummy_runner.as_deref();

    let client = GitHubClient::new(&opt.api_url, &inputs.token)?;

    match opt.cmd {
        Command::CleanupRunners { dry_run } => {
            cleanup_runners(&client, &repo, dummy_runner, dry_run).await?;
        }
        Command::CancelQueued { dry_run } => {
            cancel_queued(&client, &repo, dry_run).await?;
        }
        Command::ListRunners {} => {
            list_runners(&client, &repo, dummy_runner).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Opt::command().debug_assert();
    }

    #[test]
    fn test_parse_cleanup_with_repo() {
        let opt = Opt::try_parse_from([
            "runner-janitor",
            "cleanup-runners",
            "--dry-run",
            "--repo",
            "octo-org/hello-world",
        ])
        .unwrap();
        assert_eq!(opt.repo.as_deref(), Some("octo-org/hello-world"));
        assert!(matches!(opt.cmd, Command::CleanupRunners { dry_run: true }));
    }

    #[test]
    fn test_ci_flag_set_in_dotenv_is_seen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "CI=true\n").unwrap();

        assert!(load_environment(Some(&path)));
        assert!(is_ci(&process_env));
    }

    #[test]
    fn test_parse_cancel_defaults() {
        let opt = Opt::try_parse_from(["runner-janitor", "cancel-queued"]).unwrap();
        assert!(matches!(opt.cmd, Command::CancelQueued { dry_run: false }));
    }
}
