//! Shared test helpers: a scripted in-memory API and a recording sleeper.

use crate::batch::poller::Sleeper;
use crate::client::SnapshotApi;
use crate::error::{Error, Result};
use crate::types::{SnapshotPayload, TaskCode, TaskId, TaskStatus, ZonePage};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted reply: a value, or an HTTP status the fake answers with
pub(crate) type Reply<T> = std::result::Result<T, u16>;

/// Build a remote API error with the given status
pub(crate) fn api_error(status: u16, path: &str) -> Error {
    Error::Api {
        status,
        method: "FAKE".to_string(),
        path: path.to_string(),
        body: format!("scripted HTTP {}", status),
    }
}

/// Build a task status
pub(crate) fn status(code: &str, message: &str) -> TaskStatus {
    TaskStatus {
        code: TaskCode::from(code.to_string()),
        message: message.to_string(),
        result_uri: None,
    }
}

#[derive(Default)]
struct State {
    pages: VecDeque<Reply<ZonePage>>,
    creates: HashMap<String, Reply<TaskId>>,
    restores: HashMap<String, Reply<TaskId>>,
    snapshots: HashMap<String, Reply<SnapshotPayload>>,
    tasks: HashMap<String, VecDeque<Reply<TaskStatus>>>,
    results: HashMap<String, serde_json::Value>,
    calls: Vec<String>,
}

/// In-memory [`SnapshotApi`] answering from a script
///
/// Zones without a scripted reply answer 404, task status scripts are
/// consumed one entry per check and answer 500 once exhausted, so an
/// unexpected extra call shows up as a failure.
#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<State>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(self, page: ZonePage) -> Self {
        self.state.lock().unwrap().pages.push_back(Ok(page));
        self
    }

    pub(crate) fn with_page_error(self, status: u16) -> Self {
        self.state.lock().unwrap().pages.push_back(Err(status));
        self
    }

    pub(crate) fn with_create(self, zone: &str, reply: Reply<&str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .creates
            .insert(zone.to_string(), reply.map(TaskId::from));
        self
    }

    pub(crate) fn with_restore(self, zone: &str, reply: Reply<&str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .restores
            .insert(zone.to_string(), reply.map(TaskId::from));
        self
    }

    pub(crate) fn with_snapshot(self, zone: &str, reply: Reply<SnapshotPayload>) -> Self {
        self.state
            .lock()
            .unwrap()
            .snapshots
            .insert(zone.to_string(), reply);
        self
    }

    pub(crate) fn with_task(self, task: &str, script: Vec<Reply<TaskStatus>>) -> Self {
        self.state
            .lock()
            .unwrap()
            .tasks
            .insert(task.to_string(), script.into());
        self
    }

    pub(crate) fn with_task_result(self, task: &str, result: serde_json::Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .results
            .insert(task.to_string(), result);
        self
    }

    /// Every call made so far, as `kind:argument` strings
    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn zone_reply<T: Clone>(map: &HashMap<String, Reply<T>>, zone: &str, path: &str) -> Result<T> {
    match map.get(zone) {
        Some(Ok(value)) => Ok(value.clone()),
        Some(Err(status)) => Err(api_error(*status, path)),
        None => Err(api_error(404, path)),
    }
}

#[async_trait]
impl SnapshotApi for FakeApi {
    async fn list_zones(&self, cursor: Option<&str>, limit: u32) -> Result<ZonePage> {
        self.record(format!("list:{}:{}", cursor.unwrap_or("-"), limit));
        match self.state.lock().unwrap().pages.pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(status)) => Err(api_error(status, "/v3/zones")),
            None => Err(api_error(500, "/v3/zones")),
        }
    }

    async fn create_snapshot(&self, zone: &str, _description: &str) -> Result<TaskId> {
        self.record(format!("create:{}", zone));
        let state = self.state.lock().unwrap();
        zone_reply(&state.creates, zone, "/v1/zones/snapshot")
    }

    async fn restore_snapshot(&self, zone: &str) -> Result<TaskId> {
        self.record(format!("restore:{}", zone));
        let state = self.state.lock().unwrap();
        zone_reply(&state.restores, zone, "/v1/zones/restore")
    }

    async fn get_snapshot(&self, zone: &str) -> Result<SnapshotPayload> {
        self.record(format!("get:{}", zone));
        let state = self.state.lock().unwrap();
        zone_reply(&state.snapshots, zone, "/v1/zones/snapshot")
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus> {
        self.record(format!("status:{}", task_id));
        let mut state = self.state.lock().unwrap();
        let next = state
            .tasks
            .get_mut(task_id.as_str())
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(status)) => Ok(status),
            Some(Err(code)) => Err(api_error(code, "/tasks")),
            None => Err(api_error(500, "/tasks")),
        }
    }

    async fn task_result(&self, task_id: &TaskId) -> Result<serde_json::Value> {
        self.record(format!("result:{}", task_id));
        let state = self.state.lock().unwrap();
        state
            .results
            .get(task_id.as_str())
            .cloned()
            .ok_or_else(|| api_error(404, "/tasks/result"))
    }
}

/// [`Sleeper`] that records requested durations and returns immediately
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
