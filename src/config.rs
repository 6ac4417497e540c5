use std::time::Duration;

use miette::Diagnostic;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::InvalidHeaderValue;
use thiserror::Error;
use url::Url;

pub const BASE_URL_ENV: &str = "USER_API_BASE_URL";
pub const TOKEN_ENV: &str = "API_TOKEN";
pub const TIMEOUT_ENV: &str = "API_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.example.com/users";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("`{url}` is not a valid base URL: {source}")]
    #[diagnostic(
        code(kontrakt::config::base_url),
        help("set USER_API_BASE_URL or --base-url to an absolute URL like https://api.example.com/users")
    )]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("`{0}` uses an unsupported scheme, only http and https are allowed")]
    #[diagnostic(code(kontrakt::config::scheme))]
    UnsupportedScheme(String),

    #[error("the API token can't be sent as a header value")]
    #[diagnostic(
        code(kontrakt::config::token),
        help("check API_TOKEN for newlines or other control characters")
    )]
    InvalidToken(#[source] InvalidHeaderValue),

    #[error("the request timeout must be greater than zero")]
    #[diagnostic(code(kontrakt::config::timeout))]
    ZeroTimeout,

    #[error("can't build an endpoint from `{base}` and `{path}`: {source}")]
    #[diagnostic(code(kontrakt::config::endpoint))]
    InvalidEndpoint {
        base: String,
        path: String,
        source: url::ParseError,
    },
}

/// Settings shared by every contract in a run.
///
/// Built once at start-up and never mutated afterwards. The base URL is kept
/// without a trailing slash so endpoints are formed by plain concatenation with
/// a path that is either empty or starts with `/`.
#[derive(Debug, Clone)]
pub struct Config {
    base_url: String,
    authorization: Option<HeaderValue>,
    timeout: Duration,
}

impl Config {
    /// An empty token is treated the same as no token at all.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim().strip_suffix('/').unwrap_or(base_url.trim());

        let parsed = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.to_owned(),
            source,
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.to_owned()));
        }

        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let authorization = token
            .filter(|token| !token.is_empty())
            .map(bearer)
            .transpose()?;

        Ok(Self {
            base_url: trimmed.to_owned(),
            authorization,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_token(&self) -> bool {
        self.authorization.is_some()
    }

    /// Joins `path` onto the base URL. `path` is expected to be empty or to
    /// begin with `/`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        Url::parse(&format!("{}{path}", self.base_url)).map_err(|source| {
            ConfigError::InvalidEndpoint {
                base: self.base_url.clone(),
                path: path.to_owned(),
                source,
            }
        })
    }

    /// Headers sent with every request. Only contains `Authorization` when a
    /// token was configured.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = &self.authorization {
            headers.insert(AUTHORIZATION, value.clone());
        }
        headers
    }
}

fn bearer(token: &str) -> Result<HeaderValue, ConfigError> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(ConfigError::InvalidToken)?;
    value.set_sensitive(true);
    Ok(value)
}
