// ESG Survey - terminal entry point

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use esg_survey::cli::{Cli, Commands};
use esg_survey::services::persistence::build_persistence;
use esg_survey::services::render::{LineInput, TerminalPresenter};
use esg_survey::services::survey::{build_runner, topic_source, SessionOutcome, SessionState};
use esg_survey::storage::config::{sheets_token_from_env, ConfigService};
use esg_survey_core::ContentSource;
use esg_survey_llm::{create_provider, Completer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    }
    .context("failed to load configuration")?;

    match cli.command() {
        Commands::Run { echo } => run_survey(&config_service, echo).await,
        Commands::Topics => {
            let topics = topic_source(&config_service.get_config().survey).topics();
            for topic in topics {
                println!("{:>2}. {}", topic.index + 1, topic.headline);
            }
            Ok(())
        }
        Commands::Check => {
            let config = config_service.resolved_config();
            let provider = create_provider(config.provider)?;
            provider
                .health_check()
                .await
                .with_context(|| format!("{} ({}) is not reachable", provider.name(), provider.model()))?;
            println!("{} ({}): ok", provider.name(), provider.model());
            Ok(())
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(config_service.get_config())?);
            Ok(())
        }
    }
}

async fn run_survey(config_service: &ConfigService, echo: bool) -> Result<()> {
    let config = config_service.resolved_config();
    let session_id = Uuid::new_v4().to_string();

    let provider = create_provider(config.provider.clone())?;
    let completion = Arc::new(Completer::new(provider));
    let persistence = build_persistence(
        &config.persistence,
        &session_id,
        sheets_token_from_env(),
        config.provider.proxy.as_ref(),
    )?;
    let runner = build_runner(
        &config.survey,
        &topic_source(&config.survey),
        completion,
        persistence,
    )?;

    let mut presenter = TerminalPresenter::new(std::io::stdout(), echo);
    let mut input = LineInput::stdin();
    let report = runner
        .run_session(SessionState::new(session_id), &mut input, &mut presenter)
        .await?;

    match &report.outcome {
        SessionOutcome::Completed { persisted, .. } => {
            info!(session_id = %report.state.session_id, persisted, "survey completed")
        }
        SessionOutcome::InvalidProfile(e) => {
            info!(session_id = %report.state.session_id, error = %e, "survey ended without a valid profile")
        }
        SessionOutcome::Abandoned => {
            info!(session_id = %report.state.session_id, turns = report.state.turn_count(), "survey abandoned")
        }
    }
    Ok(())
}
