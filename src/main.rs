use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use kontrakt::KontraktError;
use kontrakt::cli::Cli;
use kontrakt::config::Config;
use kontrakt::contracts::user_api_suite;
use kontrakt::load_suite;
use kontrakt::run_pipeline;
use kontrakt::telemetry;
use miette::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    telemetry::init();

    let cli = Cli::parse();

    // Configuration is read once here and only passed by reference afterwards.
    let config = Config::new(
        &cli.base_url,
        cli.token.as_deref(),
        Duration::from_secs(cli.timeout_secs),
    )
    .map_err(KontraktError::ConfigError)?;

    tracing::info!(
        base_url = config.base_url(),
        authenticated = config.has_token(),
        timeout = ?config.timeout(),
        "configuration loaded"
    );

    let (target, contracts) = match &cli.suite {
        Some(path) => (path.clone(), load_suite(path, &config)?),
        None => (
            config.base_url().to_owned(),
            user_api_suite(&config, &cli.fixtures()).map_err(KontraktError::ConfigError)?,
        ),
    };

    let summary = run_pipeline(&config, contracts, &target).await?;

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
