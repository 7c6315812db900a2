// ABOUTME: Tracking error types with SNAFU pattern.
// ABOUTME: Callers can always recover the last-known deployment or the leaked hook name.

use snafu::Snafu;

use crate::api::{ApiError, Deployment};

/// Errors raised while driving a deployment to completion.
///
/// A failed stage is NOT an error: it comes back as a normal `Deployment`
/// whose latest stage status is `failure`, and the caller decides whether
/// that is fatal.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TrackError {
    /// A remote call failed after the deployment existed. Carries the
    /// last-known snapshot so callers can report how far it got.
    #[snafu(display("deployment {} did not finish: {source}", deployment.id))]
    Deployment {
        deployment: Box<Deployment>,
        source: ApiError,
    },

    /// The one-shot deploy hook was triggered (or trigger was attempted)
    /// but its cleanup delete failed. The hook still exists remotely and
    /// must be deleted by hand.
    #[snafu(display(
        "deploy hook '{hook_name}' could not be deleted; remove it manually: {source}"
    ))]
    HookCleanup { hook_name: String, source: ApiError },

    /// A remote call failed before any deployment existed.
    #[snafu(display("Pages API request failed: {source}"))]
    Api { source: ApiError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackErrorKind {
    /// Mid-flight remote failure with a last-known deployment attached.
    Deployment,
    /// A deploy hook leaked and needs manual deletion.
    HookCleanup,
    /// Remote failure with no deployment to report.
    Api,
}

impl TrackError {
    pub fn kind(&self) -> TrackErrorKind {
        match self {
            TrackError::Deployment { .. } => TrackErrorKind::Deployment,
            TrackError::HookCleanup { .. } => TrackErrorKind::HookCleanup,
            TrackError::Api { .. } => TrackErrorKind::Api,
        }
    }

    /// The last-known deployment snapshot, if the run got that far.
    pub fn last_deployment(&self) -> Option<&Deployment> {
        match self {
            TrackError::Deployment { deployment, .. } => Some(deployment),
            _ => None,
        }
    }

    /// The name of a leaked deploy hook, if that is what went wrong.
    pub fn leaked_hook(&self) -> Option<&str> {
        match self {
            TrackError::HookCleanup { hook_name, .. } => Some(hook_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiErrorEntry;

    fn api_error() -> ApiError {
        ApiError::Platform {
            method: "GET",
            path: "/x".to_string(),
            status: 500,
            errors: vec![ApiErrorEntry {
                code: 8000000,
                message: "An unknown error occurred".to_string(),
            }],
        }
    }

    #[test]
    fn hook_cleanup_error_names_the_hook() {
        let err = TrackError::HookCleanup {
            hook_name: "shipwatch-20220201150415-a1b2c3".to_string(),
            source: api_error(),
        };
        assert_eq!(err.kind(), TrackErrorKind::HookCleanup);
        assert_eq!(err.leaked_hook(), Some("shipwatch-20220201150415-a1b2c3"));
        assert!(err.to_string().contains("shipwatch-20220201150415-a1b2c3"));
        assert!(err.to_string().contains("remove it manually"));
    }

    #[test]
    fn api_error_has_no_deployment() {
        let err = TrackError::Api { source: api_error() };
        assert_eq!(err.kind(), TrackErrorKind::Api);
        assert!(err.last_deployment().is_none());
        assert!(err.leaked_hook().is_none());
    }
}
