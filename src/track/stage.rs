// ABOUTME: Stage model: completion/skip predicates and display labels for log groups.
// ABOUTME: Unknown names and statuses are opaque; position-based detection covers them.

use crate::api::{Deployment, Stage, StageName};

pub fn is_stage_success(stage: &Stage) -> bool {
    stage.status.is_success()
}

pub fn is_stage_failure(stage: &Stage) -> bool {
    stage.status.is_failure()
}

pub fn is_stage_complete(stage: &Stage) -> bool {
    stage.status.is_complete()
}

/// The queued stage is the one stage that may be genuinely active while
/// producing no log lines at all.
pub fn is_queued_stage(stage: &Stage) -> bool {
    stage.name == StageName::Queued
}

/// True when the platform's `latest_stage` pointer sits strictly after
/// `name` in the deployment's stage list.
///
/// This is how we notice that the platform silently advanced past a stage
/// whose status never reached a recognized terminal value.
pub fn is_past_stage(deployment: &Deployment, name: &StageName) -> bool {
    let position = |wanted: &StageName| deployment.stages.iter().position(|s| &s.name == wanted);

    let Some(latest) = deployment.latest_stage.as_ref() else {
        return false;
    };
    let (Some(stage_index), Some(latest_index)) = (position(name), position(&latest.name)) else {
        return false;
    };

    latest_index > stage_index
}

/// Visually friendly label for a stage's log group. Title case for the
/// known stages, raw name for anything the platform invents.
pub fn display_name(name: &StageName) -> &str {
    match name {
        StageName::Queued => "Queued",
        StageName::Initialize => "Initialize",
        StageName::CloneRepo => "Clone Repo",
        StageName::Build => "Build",
        StageName::Deploy => "Deploy",
        StageName::Other(other) => other,
    }
}

/// Extra lines printed when a stage's group opens, before any remote logs.
pub fn banner_lines(name: &StageName) -> &'static [&'static str] {
    match name {
        StageName::Build => &["Building application..."],
        _ => &[],
    }
}
