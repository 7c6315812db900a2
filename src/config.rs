// ABOUTME: Run configuration: credentials, branch selection, and log delivery mode.
// ABOUTME: Branch derivation mirrors the production/preview/branch input rules.

use crate::api::Project;
use crate::error::Error;
use crate::track::LogMode;

/// Everything one orchestration run needs to know, resolved before any
/// remote call is made.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub account_id: String,
    pub project_name: String,
    pub api_key: String,
    pub email: String,
    pub production: bool,
    pub preview: bool,
    pub branch: Option<String>,
    pub github_token: Option<String>,
    /// Branch of the triggering pull request, when there is one.
    pub current_branch: Option<String>,
    /// `owner/repo` slug of the repository this run executes in.
    pub current_repo: Option<String>,
    pub log_mode: LogMode,
}

impl RunConfig {
    /// Decide which branch to deploy. `None` means the production branch.
    ///
    /// `production`, `preview`, and `branch` are mutually exclusive. With
    /// no input (or `preview`) the current pull-request branch is used,
    /// which requires this repo to be the one backing the Pages project.
    pub fn derive_branch(&self, project: &Project) -> Result<Option<String>, Error> {
        let input_count = [
            self.production,
            self.preview,
            self.branch.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if input_count > 1 {
            return Err(Error::ConflictingBranchInputs);
        }

        let implicit = input_count == 0 || self.preview;

        if implicit && !self.is_project_repo(project) {
            return Err(Error::RepoMismatch {
                current: self.current_repo.clone().unwrap_or_default(),
                project: project.repo_slug(),
            });
        }

        if implicit && self.current_branch.is_none() {
            return Err(Error::MissingBranch);
        }

        if self.production {
            return Ok(None);
        }
        if self.preview {
            return Ok(self.current_branch.clone());
        }
        if let Some(branch) = &self.branch {
            validate_branch_name(branch)?;
            return Ok(Some(branch.clone()));
        }

        Ok(self.current_branch.clone())
    }

    fn is_project_repo(&self, project: &Project) -> bool {
        self.current_repo.as_deref() == Some(project.repo_slug().as_str())
    }
}

/// Reject names git itself would refuse as a ref.
pub fn validate_branch_name(branch: &str) -> Result<(), Error> {
    if branch.len() > 255 {
        return Err(Error::BranchNameTooLong(branch.len()));
    }

    let invalid = branch.is_empty()
        || branch == "@"
        || branch.starts_with('/')
        || branch.ends_with('/')
        || branch.ends_with('.')
        || branch.contains("..")
        || branch.contains("//")
        || branch.contains("@{")
        || branch.contains('\\')
        || branch
            .chars()
            .any(|c| c.is_control() || " ~^:?*[".contains(c));

    if invalid {
        return Err(Error::InvalidBranchName(branch.to_string()));
    }

    Ok(())
}
