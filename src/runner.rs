use std::error::Error as _;
use std::time::Duration;

use flume::Sender;
use reqwest::Client;
use reqwest::Method;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::validator::Assertion;
use crate::validator::Contract;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to build the HTTP client: {0}")]
    ClientError(#[from] reqwest::Error),

    #[error("the asserter stopped receiving results")]
    ChannelClosed,
}

/// Why a request produced no response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestFailure {
    #[error("no response from {url} within {timeout:?}")]
    Timeout { url: Url, timeout: Duration },

    #[error("could not connect to {url}: {message}")]
    Connect { url: Url, message: String },

    #[error("request to {url} failed: {message}")]
    Other { url: Url, message: String },
}

#[derive(Debug)]
pub struct RunnerResult {
    pub name: String,
    pub method: Method,
    pub url: Url,
    pub attempts: Vec<Result<CapturedResponse, RequestFailure>>,
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body_text: String,
    pub body_json: Result<serde_json::Value, String>,
}

impl CapturedResponse {
    pub async fn from_response(resp: Response) -> Result<Self, reqwest::Error> {
        let status = resp.status();
        let headers = resp.headers().clone();

        // Consume the body exactly once
        let body_text = resp.text().await?;

        Ok(Self::new(status, headers, body_text))
    }

    pub fn new(status: StatusCode, headers: HeaderMap, body_text: String) -> Self {
        let body_json =
            serde_json::from_str::<serde_json::Value>(&body_text).map_err(|e| e.to_string());

        Self {
            status,
            headers,
            body_text,
            body_json,
        }
    }
}

/// Builds the one client used for the whole run. The auth header and the
/// timeout from `config` apply to every request it sends.
pub fn build_client(config: &Config) -> Result<Client, RunnerError> {
    let client = Client::builder()
        .timeout(config.timeout())
        .default_headers(config.auth_headers())
        .build()?;

    Ok(client)
}

/// Sends every contract's requests, one at a time and in order, and forwards
/// the captured responses to the asserter.
pub async fn run_contracts(
    contracts: Vec<Contract>,
    client: Client,
    timeout: Duration,
    tx: Sender<RunnerResult>,
) -> Result<(), RunnerError> {
    for contract in contracts {
        let mut attempts = Vec::new();

        for attempt in 1..=contract.attempts {
            tracing::debug!(
                contract = %contract.name,
                method = %contract.method,
                url = %contract.url,
                attempt,
                "sending request"
            );

            let outcome = send(&client, &contract, timeout).await;

            match &outcome {
                Ok(response) => tracing::debug!(
                    contract = %contract.name,
                    status = %response.status,
                    "received response"
                ),
                Err(failure) => tracing::warn!(contract = %contract.name, %failure, "request failed"),
            }

            let failed = outcome.is_err();
            attempts.push(outcome);

            // No retries: a failed attempt ends the contract.
            if failed {
                break;
            }
        }

        let runner_result = RunnerResult {
            name: contract.name,
            method: contract.method,
            url: contract.url,
            attempts,
            assertions: contract.assertions,
        };

        tx.send_async(runner_result)
            .await
            .map_err(|_| RunnerError::ChannelClosed)?;
    }

    Ok(())
}

async fn send(
    client: &Client,
    contract: &Contract,
    timeout: Duration,
) -> Result<CapturedResponse, RequestFailure> {
    let request = client
        .request(contract.method.clone(), contract.url.clone())
        .headers(contract.headers.clone());

    let request = match &contract.body {
        Some(body) => request.json(body),
        None => request,
    };

    let response = request
        .send()
        .await
        .map_err(|err| classify(err, &contract.url, timeout))?;

    CapturedResponse::from_response(response)
        .await
        .map_err(|err| classify(err, &contract.url, timeout))
}

fn classify(err: reqwest::Error, url: &Url, timeout: Duration) -> RequestFailure {
    let url = url.clone();

    if err.is_timeout() {
        return RequestFailure::Timeout { url, timeout };
    }

    let message = error_chain(&err);

    if err.is_connect() {
        RequestFailure::Connect { url, message }
    } else {
        RequestFailure::Other { url, message }
    }
}

/// reqwest's own message hides the underlying cause, so walk the sources.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
