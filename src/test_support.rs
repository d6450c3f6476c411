use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::client::ActionsApi;
use crate::error::ApiError;
use crate::project::Repo;
use crate::runner::Runner;
use crate::workflow_run::WorkflowRun;

/// In-memory `ActionsApi` that records every mutation it is asked to perform.
#[derive(Default)]
pub struct FakeApi {
    pub runners: Vec<Runner>,
    pub runs: Vec<WorkflowRun>,
    pub fail_list: Option<String>,
    pub fail_deletes: HashMap<u64, String>,
    pub fail_cancels: HashMap<u64, String>,
    pub delete_calls: Mutex<Vec<u64>>,
    pub cancel_calls: Mutex<Vec<u64>>,
}

impl FakeApi {
    pub fn with_runners(runners: Vec<Runner>) -> Self {
        Self {
            runners,
            ..Default::default()
        }
    }

    pub fn with_runs(runs: Vec<WorkflowRun>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    pub fn failing_delete(mut self, id: u64, message: &str) -> Self {
        self.fail_deletes.insert(id, message.to_string());
        self
    }

    pub fn failing_cancel(mut self, id: u64, message: &str) -> Self {
        self.fail_cancels.insert(id, message.to_string());
        self
    }

    pub fn deleted(&self) -> Vec<u64> {
        let mut calls = self.delete_calls.lock().unwrap().clone();
        calls.sort_unstable();
        calls
    }

    pub fn cancelled(&self) -> Vec<u64> {
        let mut calls = self.cancel_calls.lock().unwrap().clone();
        calls.sort_unstable();
        calls
    }

    fn list_error(&self) -> Result<(), ApiError> {
        match &self.fail_list {
            Some(message) => Err(ApiError::from_response(500, &HeaderMap::new(), message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ActionsApi for FakeApi {
    async fn list_runners(&self, _repo: &Repo) -> Result<Vec<Runner>, ApiError> {
        self.list_error()?;
        Ok(self.runners.clone())
    }

    async fn delete_runner(&self, _repo: &Repo, runner_id: u64) -> Result<(), ApiError> {
        self.delete_calls.lock().unwrap().push(runner_id);
        tokio::task::yield_now().await;
        match self.fail_deletes.get(&runner_id) {
            Some(message) => Err(ApiError::from_response(422, &HeaderMap::new(), message)),
            None => Ok(()),
        }
    }

    async fn list_queued_runs(&self, _repo: &Repo) -> Result<Vec<WorkflowRun>, ApiError> {
        self.list_error()?;
        Ok(self.runs.clone())
    }

    async fn cancel_run(&self, _repo: &Repo, run_id: u64) -> Result<(), ApiError> {
        self.cancel_calls.lock().unwrap().push(run_id);
        tokio::task::yield_now().await;
        match self.fail_cancels.get(&run_id) {
            Some(message) => Err(ApiError::from_response(409, &HeaderMap::new(), message)),
            None => Ok(()),
        }
    }
}

pub fn repo() -> Repo {
    Repo {
        owner: "octo-org".to_string(),
        repo: "hello-world".to_string(),
    }
}

/// Log output collected by a test-local `tracing` subscriber.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Routes events on the current thread into a buffer until the guard drops.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_target(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
