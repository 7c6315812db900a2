// ABOUTME: Application-wide error types for shipwatch.
// ABOUTME: Uses thiserror for ergonomic error handling.

use thiserror::Error;

use crate::api::ApiError;
use crate::track::TrackError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("inputs `production`, `preview`, and `branch` cannot be used together; choose one")]
    ConflictingBranchInputs,

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("branch name must be 255 characters or less (received {0})")]
    BranchNameTooLong(usize),

    #[error(
        "current repo {current} is not the repo of the Pages project ({project}); \
         specify `production` or `branch` instead"
    )]
    RepoMismatch { current: String, project: String },

    #[error(
        "no pull-request branch available; specify `production` or `branch` for runs \
         not triggered by a pull request"
    )]
    MissingBranch,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Track(#[from] TrackError),
}

pub type Result<T> = std::result::Result<T, Error>;
