// ABOUTME: Wire types for the Pages deployment API.
// ABOUTME: Snapshots are owned by the remote platform; we never mutate them, only replace them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of a pipeline stage.
///
/// The platform is free to introduce stage names we have never seen, so
/// unrecognized names are carried as opaque strings rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StageName {
    Queued,
    Initialize,
    CloneRepo,
    Build,
    Deploy,
    Other(String),
}

impl StageName {
    pub fn as_str(&self) -> &str {
        match self {
            StageName::Queued => "queued",
            StageName::Initialize => "initialize",
            StageName::CloneRepo => "clone_repo",
            StageName::Build => "build",
            StageName::Deploy => "deploy",
            StageName::Other(name) => name,
        }
    }

    /// All stage names with a known meaning, in pipeline order.
    pub const KNOWN: [StageName; 5] = [
        StageName::Queued,
        StageName::Initialize,
        StageName::CloneRepo,
        StageName::Build,
        StageName::Deploy,
    ];
}

impl From<String> for StageName {
    fn from(value: String) -> Self {
        match value.as_str() {
            "queued" => StageName::Queued,
            "initialize" => StageName::Initialize,
            "clone_repo" => StageName::CloneRepo,
            "build" => StageName::Build,
            "deploy" => StageName::Deploy,
            _ => StageName::Other(value),
        }
    }
}

impl From<StageName> for String {
    fn from(value: StageName) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a pipeline stage. Unrecognized statuses are opaque strings;
/// a deployment must never fail to complete solely because the platform
/// reported a status we do not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StageStatus {
    Idle,
    Active,
    Success,
    Failure,
    Other(String),
}

impl StageStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StageStatus::Idle => "idle",
            StageStatus::Active => "active",
            StageStatus::Success => "success",
            StageStatus::Failure => "failure",
            StageStatus::Other(status) => status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageStatus::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StageStatus::Failure)
    }

    /// A stage is complete iff it reached a recognized terminal status.
    pub fn is_complete(&self) -> bool {
        self.is_success() || self.is_failure()
    }
}

impl From<String> for StageStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "idle" => StageStatus::Idle,
            "active" => StageStatus::Active,
            "success" => StageStatus::Success,
            "failure" => StageStatus::Failure,
            _ => StageStatus::Other(value),
        }
    }
}

impl From<StageStatus> for String {
    fn from(value: StageStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named phase of the remote pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: StageName,
    pub status: StageStatus,
    pub started_on: Option<DateTime<Utc>>,
    pub ended_on: Option<DateTime<Utc>>,
}

/// One run of the remote pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub project_name: String,
    pub environment: String,
    pub url: String,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    pub latest_stage: Option<Stage>,
    pub deployment_trigger: DeploymentTrigger,
    pub stages: Vec<Stage>,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentTrigger {
    #[serde(rename = "type")]
    pub kind: String,
    pub metadata: TriggerMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerMetadata {
    pub branch: String,
    pub commit_hash: String,
    pub commit_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: String,
    pub config: SourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub owner: String,
    pub repo_name: String,
    pub production_branch: String,
}

/// The Pages project a deployment belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub source: Source,
}

impl Project {
    pub fn production_branch(&self) -> &str {
        &self.source.config.production_branch
    }

    /// The `owner/repo` slug of the repository backing this project.
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.source.config.owner, self.source.config.repo_name)
    }
}

/// A log line delivered over the push (live) channel. Push entries carry no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// A log line from a pull-mode stage snapshot. Ids are unique and
/// non-decreasing within one stage's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Pull-mode snapshot of one stage's full log history. The API has no
/// tail-only fetch; every poll returns the entire set again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLogs {
    pub name: StageName,
    pub status: StageStatus,
    pub started_on: Option<DateTime<Utc>>,
    pub ended_on: Option<DateTime<Utc>>,
    pub start: u64,
    pub end: u64,
    pub total: u64,
    pub data: Vec<StageLogEntry>,
}

/// A temporary, single-use deploy trigger on the remote platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployHook {
    pub hook_id: String,
    pub name: String,
    pub branch: String,
}

/// Result of executing a deploy hook: the id of the deployment it started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookExecution {
    pub id: String,
}

/// Standard response envelope returned by every Pages API endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub result: Option<T>,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorEntry {
    pub code: i64,
    pub message: String,
}
