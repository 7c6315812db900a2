// ABOUTME: Deployment progress tracker: stage model, log windowing, polling, orchestration.
// ABOUTME: Exports the orchestrator plus the pieces tests drive individually.

mod error;
mod hook;
mod orchestrator;
mod poll;
mod stage;
mod tracker;
mod window;

pub use error::{TrackError, TrackErrorKind};
pub use hook::{deploy_via_hook, hook_name};
pub use orchestrator::{LogMode, Orchestrator};
pub use poll::{PAST_STAGE_CHECK_EVERY, PollIntervals, PollState, Poller};
pub use stage::{
    banner_lines, display_name, is_past_stage, is_queued_stage, is_stage_complete,
    is_stage_failure, is_stage_success,
};
pub use tracker::{StageOutcome, StageTracker};
pub use window::{LogWindow, PullCursor, SharedLogWindow};
