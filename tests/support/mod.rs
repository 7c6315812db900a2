// ABOUTME: Test support utilities.
// ABOUTME: Provides a programmable Pages API fake, recording sinks, and fixtures.

use std::collections::{HashMap, VecDeque};
use std::sync::Once;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use shipwatch::api::{
    ApiError, ApiErrorEntry, DeployHook, Deployment, DeploymentTrigger, HookExecution,
    LiveLogsHandle, LogEntry, LogSink, PagesApi, Project, Source, SourceConfig, Stage,
    StageLogEntry, StageLogs, StageName, StageStatus, TriggerMetadata,
};
use shipwatch::console::Console;
use shipwatch::handlers::DeploymentHandlers;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("shipwatch=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

// =============================================================================
// Fixtures
// =============================================================================

#[allow(dead_code)]
pub fn ts(value: &str) -> DateTime<Utc> {
    value.parse().expect("valid fixture timestamp")
}

#[allow(dead_code)]
pub fn entry(timestamp: &str, message: &str) -> LogEntry {
    LogEntry {
        timestamp: ts(timestamp),
        message: message.to_string(),
    }
}

#[allow(dead_code)]
pub fn stage(name: &str, status: &str, started: Option<&str>, ended: Option<&str>) -> Stage {
    Stage {
        name: StageName::from(name.to_string()),
        status: StageStatus::from(status.to_string()),
        started_on: started.map(ts),
        ended_on: ended.map(ts),
    }
}

/// A deployment snapshot; `latest` indexes into `stages`.
#[allow(dead_code)]
pub fn deployment(stages: Vec<Stage>, latest: usize) -> Deployment {
    let latest_stage = stages.get(latest).cloned();
    Deployment {
        id: "a50b60b9-ac32-4279-9e53-2ad913a94a03".to_string(),
        project_name: "example-project".to_string(),
        environment: "production".to_string(),
        url: "https://a50b60b9.example-project.pages.dev".to_string(),
        created_on: ts("2022-02-01T15:04:15Z"),
        modified_on: ts("2022-02-01T15:04:19Z"),
        latest_stage,
        deployment_trigger: DeploymentTrigger {
            kind: "ad_hoc".to_string(),
            metadata: TriggerMetadata {
                branch: "main".to_string(),
                commit_hash: "d3b07384d113edec49eaa6238ad5ff00".to_string(),
                commit_message: "hello world".to_string(),
            },
        },
        stages,
        source: project().source,
    }
}

#[allow(dead_code)]
pub fn project() -> Project {
    Project {
        name: "example-project".to_string(),
        source: Source {
            kind: "github".to_string(),
            config: SourceConfig {
                owner: "example-owner".to_string(),
                repo_name: "example-repo".to_string(),
                production_branch: "main".to_string(),
            },
        },
    }
}

/// A pull-mode stage log snapshot with one entry per (id, message) pair.
#[allow(dead_code)]
pub fn stage_logs(
    name: &str,
    status: &str,
    entries: &[(u64, &str)],
) -> StageLogs {
    let data: Vec<StageLogEntry> = entries
        .iter()
        .map(|(id, message)| StageLogEntry {
            id: *id,
            timestamp: ts("2022-02-01T15:06:33Z"),
            message: message.to_string(),
        })
        .collect();
    StageLogs {
        name: StageName::from(name.to_string()),
        status: StageStatus::from(status.to_string()),
        started_on: Some(ts("2022-02-01T15:06:32Z")),
        ended_on: None,
        start: data.first().map(|e| e.id).unwrap_or(0),
        end: data.last().map(|e| e.id).unwrap_or(0),
        total: data.len() as u64,
        data,
    }
}

#[allow(dead_code)]
pub fn api_error(message: &str) -> ApiError {
    ApiError::Platform {
        method: "GET",
        path: "/test".to_string(),
        status: 500,
        errors: vec![ApiErrorEntry {
            code: 8000000,
            message: message.to_string(),
        }],
    }
}

// =============================================================================
// Programmable Pages API fake
// =============================================================================

/// One step served by `get_deployment_info`: a snapshot plus the live log
/// entries that "arrived" since the previous poll, or a failure.
#[allow(dead_code)]
pub enum InfoStep {
    Snapshot(Deployment, Vec<LogEntry>),
    Fail(String),
}

/// In-memory [`PagesApi`] with scripted responses. The last deployment
/// snapshot repeats forever, like a platform that has settled.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockApi {
    pub create_result: Mutex<Option<Deployment>>,
    pub info: Mutex<VecDeque<InfoStep>>,
    pub stage_log_steps: Mutex<HashMap<String, VecDeque<StageLogs>>>,
    pub live_backlog: Mutex<Vec<LogEntry>>,
    pub sink: Mutex<Option<LogSink>>,
    pub fail_create_hook: bool,
    pub fail_execute_hook: bool,
    pub fail_delete_hook: bool,
    pub created_hooks: Mutex<Vec<DeployHook>>,
    pub calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create(self, deployment: Deployment) -> Self {
        *self.create_result.lock() = Some(deployment);
        self
    }

    /// Queue the next snapshot served by `get_deployment_info`, delivering
    /// `entries` over the live connection as it is served.
    pub fn push_info(&self, deployment: Deployment, entries: Vec<LogEntry>) {
        self.info
            .lock()
            .push_back(InfoStep::Snapshot(deployment, entries));
    }

    pub fn push_info_failure(&self, message: &str) {
        self.info.lock().push_back(InfoStep::Fail(message.to_string()));
    }

    /// Queue the next snapshot served by `get_stage_logs` for `name`.
    pub fn push_stage_logs(&self, logs: StageLogs) {
        self.stage_log_steps
            .lock()
            .entry(logs.name.to_string())
            .or_default()
            .push_back(logs);
    }

    /// Entries replayed the moment the live connection opens.
    pub fn set_live_backlog(&self, entries: Vec<LogEntry>) {
        *self.live_backlog.lock() = entries;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(name))
            .count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn deliver(&self, entries: Vec<LogEntry>) {
        let sink = self.sink.lock();
        if let Some(sink) = sink.as_ref() {
            for entry in entries {
                sink(entry);
            }
        }
    }
}

#[async_trait]
impl PagesApi for MockApi {
    async fn get_project(&self) -> Result<Project, ApiError> {
        self.record("get_project");
        Ok(project())
    }

    async fn create_deployment(&self, branch: Option<&str>) -> Result<Deployment, ApiError> {
        self.record(format!("create_deployment({})", branch.unwrap_or("-")));
        Ok(self
            .create_result
            .lock()
            .clone()
            .expect("MockApi: create_deployment not scripted"))
    }

    async fn get_deployment_info(&self, _id: &str) -> Result<Deployment, ApiError> {
        self.record("get_deployment_info");
        let mut info = self.info.lock();
        match info.pop_front() {
            Some(InfoStep::Snapshot(deployment, entries)) => {
                if info.is_empty() {
                    // Settled: keep serving the same snapshot, entries spent.
                    info.push_back(InfoStep::Snapshot(deployment.clone(), Vec::new()));
                }
                drop(info);
                self.deliver(entries);
                Ok(deployment)
            }
            Some(InfoStep::Fail(message)) => Err(api_error(&message)),
            None => panic!("MockApi: get_deployment_info not scripted"),
        }
    }

    async fn get_stage_logs(&self, _id: &str, name: &StageName) -> Result<StageLogs, ApiError> {
        self.record(format!("get_stage_logs({name})"));
        let mut steps = self.stage_log_steps.lock();
        let queue = steps
            .get_mut(name.as_str())
            .unwrap_or_else(|| panic!("MockApi: no stage logs scripted for {name}"));
        let snapshot = queue.pop_front().expect("stage log steps exhausted");
        if queue.is_empty() {
            queue.push_back(snapshot.clone());
        }
        Ok(snapshot)
    }

    async fn create_hook(&self, name: &str, branch: &str) -> Result<DeployHook, ApiError> {
        self.record(format!("create_hook({name})"));
        if self.fail_create_hook {
            return Err(api_error("hook creation rejected"));
        }
        let hook = DeployHook {
            hook_id: "2b9d0d13".to_string(),
            name: name.to_string(),
            branch: branch.to_string(),
        };
        self.created_hooks.lock().push(hook.clone());
        Ok(hook)
    }

    async fn execute_hook(&self, hook_id: &str) -> Result<HookExecution, ApiError> {
        self.record(format!("execute_hook({hook_id})"));
        if self.fail_execute_hook {
            return Err(api_error("hook execution rejected"));
        }
        Ok(HookExecution {
            id: "a50b60b9-ac32-4279-9e53-2ad913a94a03".to_string(),
        })
    }

    async fn delete_hook(&self, hook_id: &str) -> Result<(), ApiError> {
        self.record(format!("delete_hook({hook_id})"));
        if self.fail_delete_hook {
            return Err(api_error("hook deletion rejected"));
        }
        Ok(())
    }

    async fn open_live_logs(
        &self,
        _id: &str,
        on_log: LogSink,
    ) -> Result<LiveLogsHandle, ApiError> {
        self.record("open_live_logs");
        *self.sink.lock() = Some(on_log);
        let backlog = std::mem::take(&mut *self.live_backlog.lock());
        self.deliver(backlog);
        Ok(LiveLogsHandle::detached())
    }
}

// =============================================================================
// Recording sinks
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum ConsoleEvent {
    GroupStart(String),
    GroupEnd,
    Line(String),
}

#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingConsole {
    pub events: Mutex<Vec<ConsoleEvent>>,
}

#[allow(dead_code)]
impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ConsoleEvent> {
        self.events.lock().clone()
    }

    pub fn group_titles(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ConsoleEvent::GroupStart(title) => Some(title),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ConsoleEvent::Line(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    /// Groups must be balanced: every start has a matching end and no
    /// group opens while another is open.
    pub fn assert_groups_balanced(&self) {
        let mut open = false;
        for event in self.events() {
            match event {
                ConsoleEvent::GroupStart(title) => {
                    assert!(!open, "group '{title}' opened while another was open");
                    open = true;
                }
                ConsoleEvent::GroupEnd => {
                    assert!(open, "group closed without being open");
                    open = false;
                }
                ConsoleEvent::Line(_) => {}
            }
        }
        assert!(!open, "a group was left open");
    }
}

impl Console for RecordingConsole {
    fn group_start(&self, title: &str) {
        self.events
            .lock()
            .push(ConsoleEvent::GroupStart(title.to_string()));
    }

    fn group_end(&self) {
        self.events.lock().push(ConsoleEvent::GroupEnd);
    }

    fn line(&self, message: &str) {
        self.events.lock().push(ConsoleEvent::Line(message.to_string()));
    }
}

#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingHandlers {
    pub events: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl DeploymentHandlers for RecordingHandlers {
    async fn on_start(&self, deployment: &Deployment) {
        self.events.lock().push(format!("start:{}", deployment.id));
    }

    async fn on_stage_change(&self, stage: &StageName) {
        self.events.lock().push(format!("stage:{stage}"));
    }

    async fn on_success(&self) {
        self.events.lock().push("success".to_string());
    }

    async fn on_failure(&self) {
        self.events.lock().push("failure".to_string());
    }
}
