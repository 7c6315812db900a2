// ABOUTME: Entry point for the shipwatch CLI application.
// ABOUTME: Parses arguments, runs the orchestration, and maps results to exit codes.

mod cli;

use clap::Parser;
use cli::Cli;
use shipwatch::api::{Deployment, PagesApi, PagesClient, PagesClientConfig, Stage};
use shipwatch::config::RunConfig;
use shipwatch::console::{ActionsConsole, Console};
use shipwatch::dashboard::dashboard_deployment_url;
use shipwatch::error::{Error, Result};
use shipwatch::github::GithubStatusSink;
use shipwatch::handlers::{DeploymentHandlers, NoopHandlers};
use shipwatch::track::{LogMode, Orchestrator, PollIntervals, Poller};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let account_id = cli.account_id.clone();
    let project_name = cli.project.clone();

    match run(cli).await {
        Ok(deployment) => match deployment.latest_stage.as_ref() {
            Some(stage) if stage.status.is_success() => {
                log_success(&deployment);
            }
            latest => {
                eprintln!("{}", failed_deploy_message(latest));
                std::process::exit(1);
            }
        },
        Err(e) => {
            // A stage group may still be open when an error surfaces.
            ActionsConsole.group_end();
            eprintln!("Error: {e}");

            let deployment_id = match &e {
                Error::Track(track) => track.last_deployment().map(|d| d.id.clone()),
                _ => None,
            };
            eprintln!(
                "{}",
                unexpected_error_message(&account_id, &project_name, deployment_id.as_deref())
            );
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<Deployment> {
    let config = run_config(&cli);

    let client = PagesClient::new(PagesClientConfig {
        account_id: config.account_id.clone(),
        project_name: config.project_name.clone(),
        api_key: config.api_key.clone(),
        email: config.email.clone(),
    })?;

    let project = client.get_project().await?;
    let branch = config.derive_branch(&project)?;

    let handlers: Box<dyn DeploymentHandlers> = match &config.github_token {
        Some(token) => {
            info!("GitHub token provided; a GitHub deployment will be created");
            Box::new(GithubStatusSink::new(
                token.clone(),
                config.account_id.clone(),
            ))
        }
        None => {
            info!("no GitHub token provided; skipping GitHub deployments");
            Box::new(NoopHandlers)
        }
    };

    let console = ActionsConsole;
    let poller = Poller::new(PollIntervals::from_env());
    let orchestrator = Orchestrator::new(
        &client,
        &console,
        handlers.as_ref(),
        poller,
        config.log_mode,
    );

    Ok(orchestrator.run(branch.as_deref()).await?)
}

fn run_config(cli: &Cli) -> RunConfig {
    RunConfig {
        account_id: cli.account_id.clone(),
        project_name: cli.project.clone(),
        api_key: cli.api_key.clone(),
        email: cli.email.clone(),
        production: cli.production,
        preview: cli.preview,
        branch: cli.branch.clone(),
        github_token: cli.github_token.clone(),
        current_branch: env::var("GITHUB_HEAD_REF").ok().filter(|b| !b.is_empty()),
        current_repo: env::var("GITHUB_REPOSITORY").ok().filter(|r| !r.is_empty()),
        log_mode: if cli.poll_logs {
            LogMode::Poll
        } else {
            LogMode::Live
        },
    }
}

fn log_success(deployment: &Deployment) {
    let ended = deployment
        .latest_stage
        .as_ref()
        .and_then(|s| s.ended_on)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown time".to_string());
    println!(
        "Successfully deployed {} at {}.",
        deployment.project_name, ended
    );
    println!("URL: {}", deployment.url);
}

fn failed_deploy_message(stage: Option<&Stage>) -> String {
    match stage {
        Some(stage) => format!(
            "Deployment failed on stage: {} with a status of '{}'. \
             See log output above for more information.",
            stage.name, stage.status
        ),
        None => "Deployment ended without reaching any stage.".to_string(),
    }
}

fn unexpected_error_message(
    account_id: &str,
    project_name: &str,
    deployment_id: Option<&str>,
) -> String {
    let url = dashboard_deployment_url(account_id, project_name, deployment_id);
    format!(
        "The deploy may still be in progress or may have succeeded. Go to {url} for more \
         details. If this looks like a bug, please open an issue at \
         https://github.com/vitalratel/shipwatch/issues."
    )
}
