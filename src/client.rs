use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::project::Repo;
use crate::runner::{Runner, RunnerPage};
use crate::throttle;
use crate::workflow_run::{WorkflowRun, WorkflowRunPage};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;

static NEXT_LINK: OnceLock<Regex> = OnceLock::new();

/// The slice of the GitHub Actions API used by the maintenance commands.
#[async_trait]
pub trait ActionsApi: Send + Sync {
    async fn list_runners(&self, repo: &Repo) -> Result<Vec<Runner>, ApiError>;
    async fn delete_runner(&self, repo: &Repo, runner_id: u64) -> Result<(), ApiError>;
    async fn list_queued_runs(&self, repo: &Repo) -> Result<Vec<WorkflowRun>, ApiError>;
    async fn cancel_run(&self, repo: &Repo, run_id: u64) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct GitHubClient {
    base_url: String,
    token: String,
    client: Client,
}

/// Extracts the `rel="next"` target from a `Link` header.
pub fn next_page(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    let re = NEXT_LINK.get_or_init(|| {
        Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("next-link pattern is valid")
    });
    re.captures(link).map(|c| c[1].to_string())
}

impl GitHubClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.into();

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        Url::parse(&url).map_err(|_| ApiError::Url(url))
    }

    async fn send_once(&self, method: Method, url: Url) -> Result<Response, ApiError> {
        debug!("{} {}", method, url);
        let response = self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();

        Err(ApiError::from_response(status.as_u16(), &headers, &body))
    }

    async fn send(&self, method: Method, url: Url) -> Result<Response, ApiError> {
        let label = method.to_string();
        let target = url.to_string();
        throttle::run_throttled(&label, &target, || self.send_once(method.clone(), url.clone())).await
    }

    /// Follows `Link` headers until the last page, collecting the items of every page.
    async fn paginate<P, T>(&self, first: Url, items: fn(P) -> Vec<T>) -> Result<Vec<T>, ApiError>
    where
        P: DeserializeOwned,
        T: Send,
    {
        let mut all = Vec::new();
        let mut url = first;

        loop {
            let response = self.send(Method::GET, url.clone()).await?;
            let next = next_page(response.headers());
            let text = response.text().await?;
            let page: P = serde_json::from_str(&text).map_err(|source| ApiError::Parse {
                url: url.to_string(),
                source,
            })?;
            all.extend(items(page));

            match next {
                Some(next) => url = Url::parse(&next).map_err(|_| ApiError::Url(next))?,
                None => break,
            }
        }

        Ok(all)
    }
}

#[async_trait]
impl ActionsApi for GitHubClient {
    async fn list_runners(&self, repo: &Repo) -> Result<Vec<Runner>, ApiError> {
        let url = self.url(&format!(
            "/repos/{}/{}/actions/runners?per_page={}",
            repo.owner, repo.repo, PER_PAGE
        ))?;
        self.paginate::<RunnerPage, Runner>(url, |page| page.runners)
            .await
    }

    async fn delete_runner(&self, repo: &Repo, runner_id: u64) -> Result<(), ApiError> {
        let url = self.url(&format!(
            "/repos/{}/{}/actions/runners/{}",
            repo.owner, repo.repo, runner_id
        ))?;
        self.send(Method::DELETE, url).await?;
        Ok(())
    }

    async fn list_queued_runs(&self, repo: &Repo) -> Result<Vec<WorkflowRun>, ApiError> {
        let url = self.url(&format!(
            "/repos/{}/{}/actions/runs?status=queued&per_page={}",
            repo.owner, repo.repo, PER_PAGE
        ))?;
        self.paginate::<WorkflowRunPage, WorkflowRun>(url, |page| page.workflow_runs)
            .await
    }

    async fn cancel_run(&self, repo: &Repo, run_id: u64) -> Result<(), ApiError> {
        let url = self.url(&format!(
            "/repos/{}/{}/actions/runs/{}/cancel",
            repo.owner, repo.repo, run_id
        ))?;
        self.send(Method::POST, url).await?;
        Ok(())
    }
}
