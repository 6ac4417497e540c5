use std::str::FromStr;

use miette::Diagnostic;
use miette::NamedSource;
use miette::SourceSpan;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use serde_json::Value;
use thiserror::Error;
use toml::Value as TomlValue;
use url::Url;

use crate::config::Config;
use crate::parser::Case;
use crate::parser::Expect;
use crate::parser::Suite;

const PATH_MISSING_SLASH: &str =
    "The path of a contract must be empty or begin with a leading /, it is appended to the base URL.";
const NO_EXPECTATIONS: &str = "A contract needs at least one expectation under `expect`.";

/// Upper bound for `attempts`. Every attempt is a real request against the API.
pub const MAX_ATTEMPTS: u32 = 10;

/// A single check made against a captured response.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    Status(StatusCode),
    HeaderPrefix { name: HeaderName, prefix: String },
    JsonKeys(Vec<String>),
    JsonNonEmpty(Vec<String>),
    JsonEquals { key: String, value: Value },
    NestedKeys { key: String, fields: Vec<String> },
    /// Every attempt returned the same status and the same value for `keys`.
    Stable { keys: Vec<String> },
    /// Implicit for every contract, only reported when the request itself fails.
    Reachable,
    /// A contract that checks nothing can't pass.
    HasExpectations,
}

/// A hand-built [`Contract`] that can't be run.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum ContractError {
    #[error("Contract `{0}` has no assertions")]
    #[diagnostic(help("Add at least one assertion with `Contract::expect`."))]
    NoAssertions(String),

    #[error("Contract `{name}` asks for {attempts} attempts, allowed are 1 to {max}", max = MAX_ATTEMPTS)]
    AttemptsOutOfRange { name: String, attempts: u32 },
}

/// A request and the expectations it has to meet.
#[derive(Debug, Clone)]
pub struct Contract {
    pub name: String,
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub attempts: u32,
    pub assertions: Vec<Assertion>,
}

impl Contract {
    pub fn new(name: impl Into<String>, method: Method, url: Url) -> Self {
        Self {
            name: name.into(),
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            attempts: 1,
            assertions: vec![],
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the number of requests, clamped to `1..=MAX_ATTEMPTS`.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.clamp(1, MAX_ATTEMPTS);
        self
    }

    pub fn expect(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Rejects contracts whose fields were set directly to something the
    /// runner can't honor.
    pub fn check(&self) -> Result<(), ContractError> {
        if self.assertions.is_empty() {
            return Err(ContractError::NoAssertions(self.name.clone()));
        }

        if !(1..=MAX_ATTEMPTS).contains(&self.attempts) {
            return Err(ContractError::AttemptsOutOfRange {
                name: self.name.clone(),
                attempts: self.attempts,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("Invalid field `{field}`: {message}")]
pub struct ValidationError {
    field: String,
    message: String,
    #[source_code]
    src: Option<NamedSource<String>>,
    #[label("invalid value here")]
    span: Option<SourceSpan>,
}

impl ValidationError {
    pub fn field(&self) -> &str {
        &self.field
    }
}

macro_rules! validation_err {
    ($self:expr, $field:expr, $msg:expr, $span:expr) => {
        ValidationError {
            field: $field.to_string(),
            message: $msg.to_string(),
            src: Some(NamedSource::new(
                $self.file_name.clone(),
                $self.toml_src.clone(),
            )),
            span: $span,
        }
    };
}

pub struct Validator {
    suite: Suite,
    toml_src: String,
    file_name: String,
    config: Config,
}

impl Validator {
    pub fn new(suite: &Suite, toml_src: &str, file_name: &str, config: &Config) -> Self {
        Self {
            suite: suite.clone(),
            toml_src: toml_src.into(),
            file_name: file_name.into(),
            config: config.clone(),
        }
    }

    pub fn validate(&self) -> Result<Vec<Contract>, ValidationError> {
        self.suite
            .contracts
            .iter()
            .map(|case| self.create_contract(case))
            .collect()
    }

    fn create_contract(&self, case: &Case) -> Result<Contract, ValidationError> {
        if case.name.trim().is_empty() {
            return Err(validation_err!(
                self,
                "name",
                "A contract name can't be empty.",
                self.find_span(None, "name")
            ));
        }

        let name = case.name.as_str();

        let method = parse_method(&case.method.to_uppercase()).map_err(|e| {
            validation_err!(
                self,
                format!("{name} - method"),
                e,
                self.find_span(Some(name), &case.method)
            )
        })?;

        if !case.path.is_empty() && !case.path.starts_with('/') {
            return Err(validation_err!(
                self,
                format!("{name} - path"),
                PATH_MISSING_SLASH,
                self.find_span(Some(name), &case.path)
            ));
        }

        let url = self.config.endpoint(&case.path).map_err(|e| {
            validation_err!(
                self,
                format!("{name} - path"),
                e,
                self.find_span(Some(name), &case.path)
            )
        })?;

        let attempts = match case.attempts {
            Some(n) if !(1..=MAX_ATTEMPTS).contains(&n) => {
                return Err(validation_err!(
                    self,
                    format!("{name} - attempts"),
                    format!("attempts must be between 1 and {MAX_ATTEMPTS}, got {n}"),
                    self.find_span(Some(name), "attempts")
                ));
            }
            Some(n) => n,
            None => 1,
        };

        let headers = match &case.headers {
            Some(value) => self.parse_header_map(name, value)?,
            None => HeaderMap::new(),
        };

        let mut assertions = self.parse_expectations(name, &case.expect)?;

        if assertions.is_empty() {
            return Err(validation_err!(
                self,
                format!("{name} - expect"),
                NO_EXPECTATIONS,
                self.find_span(Some(name), "expect")
            ));
        }

        if attempts > 1 {
            assertions.push(Assertion::Stable {
                keys: stable_keys(&case.expect),
            });
        }

        Ok(Contract {
            name: case.name.clone(),
            method,
            url,
            headers,
            body: case.body.clone(),
            attempts,
            assertions,
        })
    }

    fn parse_expectations(
        &self,
        name: &str,
        expect: &Expect,
    ) -> Result<Vec<Assertion>, ValidationError> {
        let mut assertions = vec![];

        if let Some(status) = expect.status {
            let status = u16::try_from(status)
                .ok()
                .filter(|code| (100..=599).contains(code))
                .and_then(|code| StatusCode::from_u16(code).ok())
                .ok_or_else(|| {
                    validation_err!(
                        self,
                        format!("{name} - expect.status"),
                        format!("{status} is not an HTTP status code between 100 and 599"),
                        self.find_span(Some(name), &status.to_string())
                    )
                })?;
            assertions.push(Assertion::Status(status));
        }

        if let Some(prefix) = &expect.content_type {
            if prefix.trim().is_empty() {
                return Err(validation_err!(
                    self,
                    format!("{name} - expect.content_type"),
                    "content_type can't be empty",
                    self.find_span(Some(name), "content_type")
                ));
            }
            assertions.push(Assertion::HeaderPrefix {
                name: CONTENT_TYPE,
                prefix: prefix.clone(),
            });
        }

        if let Some(keys) = &expect.keys {
            self.check_keys(name, "expect.keys", keys)?;
            assertions.push(Assertion::JsonKeys(keys.clone()));
        }

        if let Some(keys) = &expect.non_empty {
            self.check_keys(name, "expect.non_empty", keys)?;
            assertions.push(Assertion::JsonNonEmpty(keys.clone()));
        }

        if let Some(fields) = &expect.fields {
            for (key, value) in fields {
                assertions.push(Assertion::JsonEquals {
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }

        if let Some(nested) = &expect.nested_keys {
            for (key, fields) in nested {
                self.check_keys(name, &format!("expect.nested_keys.{key}"), fields)?;
                assertions.push(Assertion::NestedKeys {
                    key: key.clone(),
                    fields: fields.clone(),
                });
            }
        }

        Ok(assertions)
    }

    fn check_keys(&self, name: &str, field: &str, keys: &[String]) -> Result<(), ValidationError> {
        if keys.is_empty() {
            return Err(validation_err!(
                self,
                format!("{name} - {field}"),
                "the list of keys can't be empty",
                self.find_span(Some(name), field.rsplit('.').next().unwrap_or(field))
            ));
        }

        if let Some(blank) = keys.iter().find(|key| key.trim().is_empty()) {
            return Err(validation_err!(
                self,
                format!("{name} - {field}"),
                "keys can't be blank",
                self.find_span(Some(name), blank)
            ));
        }

        Ok(())
    }

    fn parse_header_map(&self, name: &str, value: &TomlValue) -> Result<HeaderMap, ValidationError> {
        let table = value.as_table().ok_or_else(|| {
            validation_err!(
                self,
                format!("{name} - headers"),
                format!("Expected a table for headers, got {value:?}"),
                self.find_span(Some(name), "headers")
            )
        })?;

        let mut header_map = HeaderMap::new();

        for (key, value) in table {
            let v_str = value.as_str().ok_or_else(|| {
                validation_err!(
                    self,
                    key,
                    format!("Header value must be a string, got {value:?}"),
                    self.find_span(Some(name), key)
                )
            })?;

            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                validation_err!(
                    self,
                    key,
                    format!("Invalid header name `{key}`: {e}"),
                    self.find_span(Some(name), key)
                )
            })?;

            let header_value = HeaderValue::from_str(v_str).map_err(|e| {
                validation_err!(
                    self,
                    key,
                    format!("Invalid header value for `{key}`: {e}"),
                    self.find_span(Some(name), v_str)
                )
            })?;

            header_map.insert(header_name, header_value);
        }

        Ok(header_map)
    }

    /// Finds `needle` in the source, starting from the contract called `anchor`
    /// when one is given. Quoted occurrences win over bare ones.
    fn find_span(&self, anchor: Option<&str>, needle: &str) -> Option<SourceSpan> {
        let start = anchor
            .and_then(|anchor| self.toml_src.find(&format!("\"{anchor}\"")))
            .unwrap_or(0);
        let haystack = &self.toml_src[start..];

        if let Some(offset) = haystack.find(&format!("\"{needle}\"")) {
            return Some(SourceSpan::new((start + offset + 1).into(), needle.len()));
        }

        haystack
            .find(needle)
            .map(|offset| SourceSpan::new((start + offset).into(), needle.len()))
    }
}

/// Keys compared across attempts: everything the contract names at the top
/// level of the body.
fn stable_keys(expect: &Expect) -> Vec<String> {
    let mut keys: Vec<String> = expect.keys.clone().unwrap_or_default();

    if let Some(fields) = &expect.fields {
        for key in fields.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }

    keys
}

fn parse_method(method: &str) -> Result<Method, String> {
    let method = Method::from_str(method).map_err(|e| e.to_string())?;

    if !matches!(
        method,
        Method::GET
            | Method::POST
            | Method::PUT
            | Method::DELETE
            | Method::PATCH
            | Method::HEAD
            | Method::OPTIONS
    ) {
        return Err(format!("Unsupported HTTP method: {method}"));
    }

    Ok(method)
}
