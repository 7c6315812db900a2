// ABOUTME: Pages API collaborator: wire types, client trait, HTTP and websocket transports.
// ABOUTME: The tracker core only ever sees the PagesApi trait.

mod client;
mod error;
mod live;
mod types;

pub use client::{LogSink, PagesApi, PagesClient, PagesClientConfig};
pub use error::ApiError;
pub use live::LiveLogsHandle;
pub use types::{
    ApiErrorEntry, DeployHook, Deployment, DeploymentTrigger, HookExecution, LogEntry, Project,
    Source, SourceConfig, Stage, StageLogEntry, StageLogs, StageName, StageStatus,
    TriggerMetadata,
};
