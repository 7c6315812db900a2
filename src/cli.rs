// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Every credential flag can also come from the environment.

use clap::Parser;

#[derive(Parser)]
#[command(name = "shipwatch")]
#[command(about = "Drives a Pages deployment to completion and streams its logs to CI")]
#[command(version)]
pub struct Cli {
    /// Pages account id
    #[arg(long, env = "SHIPWATCH_ACCOUNT_ID")]
    pub account_id: String,

    /// Pages project name
    #[arg(long, env = "SHIPWATCH_PROJECT")]
    pub project: String,

    /// API key for the Pages account
    #[arg(long, env = "SHIPWATCH_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Email the API key belongs to
    #[arg(long, env = "SHIPWATCH_EMAIL")]
    pub email: String,

    /// Deploy the project's production branch
    #[arg(long)]
    pub production: bool,

    /// Deploy the current pull-request branch as a preview
    #[arg(long)]
    pub preview: bool,

    /// Deploy a specific branch
    #[arg(long)]
    pub branch: Option<String>,

    /// GitHub token; when present, progress is mirrored as a GitHub deployment
    #[arg(long, env = "SHIPWATCH_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Poll per-stage log snapshots instead of streaming live logs
    #[arg(long)]
    pub poll_logs: bool,

    /// Verbose diagnostic output
    #[arg(short, long)]
    pub verbose: bool,
}
