#![allow(clippy::result_large_err)]

use miette::Diagnostic;
use miette::NamedSource;
use miette::SourceSpan;
use thiserror::Error;

use crate::asserter::AsserterError;
use crate::asserter::Asserter;
use crate::asserter::ContractOutcome;
use crate::config::Config;
use crate::config::ConfigError;
use crate::outputter::OutPutter;
use crate::outputter::Summary;
use crate::parser::Suite;
use crate::runner::RunnerError;
use crate::runner::RunnerResult;
use crate::validator::Contract;
use crate::validator::ContractError;
use crate::validator::ValidationError;
use crate::validator::Validator;

pub mod asserter;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod outputter;
pub mod parser;
pub mod runner;
pub mod telemetry;
pub mod validator;

#[derive(Error, Debug, Diagnostic)]
pub enum KontraktError {
    #[error("Failed to read suite file `{path}`")]
    FileError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse suite file: {message}")]
    TomlParsing {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("Suite file `{0}` contains no contracts")]
    EmptySuite(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ConfigError(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ValidationError(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ContractError(#[from] ContractError),

    #[error("Failed in the runner step: {0}")]
    RunnerError(#[from] RunnerError),

    #[error("Failed in the assert step: {0}")]
    AssertError(#[from] AsserterError),

    #[error("A pipeline task stopped unexpectedly: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

/// Reads, parses and validates the suite at `path`.
pub fn load_suite(path: &str, config: &Config) -> Result<Vec<Contract>, KontraktError> {
    let contents = std::fs::read_to_string(path).map_err(|source| KontraktError::FileError {
        path: path.to_owned(),
        source,
    })?;

    parse_suite(&contents, path, config)
}

/// Parses and validates suite source. `file_name` only labels diagnostics.
pub fn parse_suite(
    contents: &str,
    file_name: &str,
    config: &Config,
) -> Result<Vec<Contract>, KontraktError> {
    let suite: Suite = toml::from_str(contents).map_err(|e| KontraktError::TomlParsing {
        message: e.message().to_owned(),
        src: NamedSource::new(file_name, contents.to_owned()),
        span: e.span().map(SourceSpan::from),
    })?;

    if suite.contracts.is_empty() {
        return Err(KontraktError::EmptySuite(file_name.to_owned()));
    }

    let contracts = Validator::new(&suite, contents, file_name, config).validate()?;

    Ok(contracts)
}

/// Runs `contracts` through the runner, asserter and outputter stages.
///
/// The stages are separate tasks joined by flume channels. The runner sends
/// one request at a time, so contracts are checked strictly in order.
/// `target` is only used in the report header. Contracts without assertions
/// or with an out of range attempt count are rejected before anything is sent.
pub async fn run_pipeline(
    config: &Config,
    contracts: Vec<Contract>,
    target: &str,
) -> Result<Summary, KontraktError> {
    for contract in &contracts {
        contract.check()?;
    }

    let client = runner::build_client(config)?;
    let timeout = config.timeout();
    let n_contracts = contracts.len();

    let (runner_tx, asserter_rx) = flume::unbounded::<RunnerResult>();
    let (asserter_tx, outputter_rx) = flume::unbounded::<ContractOutcome>();

    let target = target.to_owned();
    let outputter_jh =
        tokio::spawn(async move { OutPutter::start(outputter_rx, &target, n_contracts).await });

    let runner_jh = tokio::spawn(async move {
        runner::run_contracts(contracts, client, timeout, runner_tx).await
    });

    let asserter_jh = tokio::spawn(async move { Asserter::run(asserter_rx, asserter_tx).await });

    let (runner, asserter, summary) = futures::join!(runner_jh, asserter_jh, outputter_jh);

    runner??;
    asserter??;

    Ok(summary?)
}
