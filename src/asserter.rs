use core::fmt;
use std::fmt::Display;
use std::sync::Arc;

use flume::Receiver;
use flume::Sender;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::runner::CapturedResponse;
use crate::runner::RequestFailure;
use crate::runner::RunnerResult;
use crate::validator::Assertion;

pub struct Asserter {}

#[derive(Error, Debug)]
pub enum AsserterError {
    #[error("the outputter stopped receiving results")]
    ChannelClosed,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TestResult {
    Pass,
    Fail,
}

#[derive(Debug, Clone)]
pub struct AssertResult {
    pub status: TestResult,
    pub expected: Assertion,
    pub actual: Actual,
}

/// What was observed for one assertion.
#[derive(Debug, Clone, PartialEq)]
pub enum Actual {
    Status(StatusCode),
    Header {
        name: HeaderName,
        value: Option<String>,
    },
    /// Keys that are absent. Empty when every key was found.
    MissingKeys(Vec<String>),
    /// Keys that are absent, null or empty. Empty when every key had a value.
    EmptyKeys(Vec<String>),
    Value {
        key: String,
        value: Option<Value>,
    },
    NotAnObject {
        key: Option<String>,
        value: Value,
    },
    MalformedJson(String),
    RequestFailed(RequestFailure),
    Diverged {
        what: String,
        attempt: usize,
        first: String,
        other: String,
    },
    Consistent(usize),
    NoAssertions,
    NoAttempts,
}

/// Everything the asserter found out about one contract.
#[derive(Debug, Clone)]
pub struct ContractOutcome {
    pub name: String,
    pub method: String,
    pub path: String,
    pub results: Arc<[AssertResult]>,
}

impl ContractOutcome {
    /// An outcome without results checked nothing and does not pass.
    pub fn passed(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.status == TestResult::Pass)
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertResult> {
        self.results.iter().filter(|r| r.status == TestResult::Fail)
    }
}

impl Display for AssertResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            TestResult::Pass => write!(
                f,
                "{} {} {}",
                console::style("✔").green().bold(),
                console::style("PASS!").green().bold(),
                self.actual
            ),
            TestResult::Fail => {
                writeln!(
                    f,
                    "{} {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                )?;
                writeln!(
                    f,
                    "  Expected: {}",
                    console::style(&self.expected).green()
                )?;
                write!(f, "  Actual:   {}", console::style(&self.actual).red())
            }
        }
    }
}

impl Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Status(status) => write!(f, "status {status}"),
            Assertion::HeaderPrefix { name, prefix } => {
                write!(f, "header `{name}` starting with `{prefix}`")
            }
            Assertion::JsonKeys(keys) => write!(f, "JSON keys {}", list(keys)),
            Assertion::JsonNonEmpty(keys) => write!(f, "non-empty JSON keys {}", list(keys)),
            Assertion::JsonEquals { key, value } => write!(f, "`{key}` == {value}"),
            Assertion::NestedKeys { key, fields } => {
                write!(f, "`{key}` to be an object with keys {}", list(fields))
            }
            Assertion::Stable { keys } if keys.is_empty() => {
                write!(f, "the same status on every attempt")
            }
            Assertion::Stable { keys } => {
                write!(f, "the same status and {} on every attempt", list(keys))
            }
            Assertion::Reachable => write!(f, "a response"),
            Assertion::HasExpectations => write!(f, "at least one assertion"),
        }
    }
}

impl Display for Actual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actual::Status(status) => write!(f, "Got status {status}"),
            Actual::Header { name, value: None } => write!(f, "Header `{name}` is missing"),
            Actual::Header {
                name,
                value: Some(value),
            } => write!(f, "Got header `{name}: {value}`"),
            Actual::MissingKeys(keys) if keys.is_empty() => write!(f, "Found every key"),
            Actual::MissingKeys(keys) => write!(f, "Missing keys {}", list(keys)),
            Actual::EmptyKeys(keys) if keys.is_empty() => write!(f, "Every key has a value"),
            Actual::EmptyKeys(keys) => write!(f, "Missing or empty keys {}", list(keys)),
            Actual::Value { key, value: None } => write!(f, "`{key}` is missing"),
            Actual::Value {
                key,
                value: Some(value),
            } => write!(f, "Got `{key}` = {value}"),
            Actual::NotAnObject { key: None, value } => {
                write!(f, "Body is not a JSON object: {value}")
            }
            Actual::NotAnObject {
                key: Some(key),
                value,
            } => write!(f, "`{key}` is not a JSON object: {value}"),
            Actual::MalformedJson(error) => write!(f, "Body is not valid JSON: {error}"),
            Actual::RequestFailed(failure) => write!(f, "Request failed: {failure}"),
            Actual::Diverged {
                what,
                attempt,
                first,
                other,
            } => write!(
                f,
                "Attempt {attempt} returned {what} {other}, attempt 1 returned {first}"
            ),
            Actual::Consistent(attempts) => write!(f, "Identical across {attempts} attempts"),
            Actual::NoAssertions => write!(f, "The contract checks nothing"),
            Actual::NoAttempts => write!(f, "No request was sent"),
        }
    }
}

fn list(keys: &[String]) -> String {
    format!("[{}]", keys.join(", "))
}

pub trait Assert {
    fn assert(&self) -> Arc<[AssertResult]>;
}

impl Assert for RunnerResult {
    fn assert(&self) -> Arc<[AssertResult]> {
        if self.assertions.is_empty() {
            return Arc::from([fail(&Assertion::HasExpectations, Actual::NoAssertions)]);
        }

        let mut responses = Vec::with_capacity(self.attempts.len());

        for attempt in &self.attempts {
            match attempt {
                Ok(response) => responses.push(response),
                Err(failure) => {
                    return Arc::from([AssertResult {
                        status: TestResult::Fail,
                        expected: Assertion::Reachable,
                        actual: Actual::RequestFailed(failure.clone()),
                    }]);
                }
            }
        }

        if responses.is_empty() {
            return Arc::from([fail(&Assertion::Reachable, Actual::NoAttempts)]);
        }

        self.assertions
            .iter()
            .map(|assertion| match assertion {
                Assertion::Stable { keys } => assert_stable(assertion, keys, &responses),
                _ => {
                    // Has to hold for every attempt, the first one that breaks
                    // it is reported.
                    let mut results: Vec<AssertResult> = responses
                        .iter()
                        .map(|response| assert_one(assertion, response))
                        .collect();
                    let index = results
                        .iter()
                        .position(|r| r.status == TestResult::Fail)
                        .unwrap_or(0);
                    results.swap_remove(index)
                }
            })
            .collect()
    }
}

impl Asserter {
    pub async fn run(
        rx: Receiver<RunnerResult>,
        output_tx: Sender<ContractOutcome>,
    ) -> Result<(), AsserterError> {
        while let Ok(msg) = rx.recv_async().await {
            let results = msg.assert();

            let outcome = ContractOutcome {
                name: msg.name,
                method: msg.method.to_string(),
                path: msg.url.path().into(),
                results,
            };

            output_tx
                .send_async(outcome)
                .await
                .map_err(|_| AsserterError::ChannelClosed)?;
        }

        Ok(())
    }
}

fn pass(expected: &Assertion, actual: Actual) -> AssertResult {
    AssertResult {
        status: TestResult::Pass,
        expected: expected.clone(),
        actual,
    }
}

fn fail(expected: &Assertion, actual: Actual) -> AssertResult {
    AssertResult {
        status: TestResult::Fail,
        expected: expected.clone(),
        actual,
    }
}

fn verdict(expected: &Assertion, ok: bool, actual: Actual) -> AssertResult {
    if ok {
        pass(expected, actual)
    } else {
        fail(expected, actual)
    }
}

fn assert_one(assertion: &Assertion, response: &CapturedResponse) -> AssertResult {
    match assertion {
        Assertion::Status(expected) => assert_status(assertion, *expected, response.status),
        Assertion::HeaderPrefix { name, prefix } => {
            assert_header_prefix(assertion, name, prefix, &response.headers)
        }
        Assertion::JsonKeys(keys) => with_object(assertion, response, |body| {
            let missing: Vec<String> = keys
                .iter()
                .filter(|key| !body.contains_key(key.as_str()))
                .cloned()
                .collect();
            verdict(assertion, missing.is_empty(), Actual::MissingKeys(missing))
        }),
        Assertion::JsonNonEmpty(keys) => with_object(assertion, response, |body| {
            let empty: Vec<String> = keys
                .iter()
                .filter(|key| body.get(key.as_str()).is_none_or(is_empty_value))
                .cloned()
                .collect();
            verdict(assertion, empty.is_empty(), Actual::EmptyKeys(empty))
        }),
        Assertion::JsonEquals { key, value } => with_object(assertion, response, |body| {
            let got = body.get(key.as_str());
            verdict(
                assertion,
                got.is_some_and(|got| json_eq(got, value)),
                Actual::Value {
                    key: key.clone(),
                    value: got.cloned(),
                },
            )
        }),
        Assertion::NestedKeys { key, fields } => with_object(assertion, response, |body| {
            match body.get(key.as_str()) {
                None => fail(assertion, Actual::MissingKeys(vec![key.clone()])),
                Some(Value::Object(nested)) => {
                    let missing: Vec<String> = fields
                        .iter()
                        .filter(|field| !nested.contains_key(field.as_str()))
                        .map(|field| format!("{key}.{field}"))
                        .collect();
                    verdict(assertion, missing.is_empty(), Actual::MissingKeys(missing))
                }
                Some(other) => fail(
                    assertion,
                    Actual::NotAnObject {
                        key: Some(key.clone()),
                        value: other.clone(),
                    },
                ),
            }
        }),
        Assertion::Stable { keys } => assert_stable(assertion, keys, &[response]),
        Assertion::Reachable => pass(assertion, Actual::Status(response.status)),
        Assertion::HasExpectations => pass(assertion, Actual::Status(response.status)),
    }
}

fn with_object(
    assertion: &Assertion,
    response: &CapturedResponse,
    check: impl FnOnce(&Map<String, Value>) -> AssertResult,
) -> AssertResult {
    match &response.body_json {
        Err(error) => fail(assertion, Actual::MalformedJson(error.clone())),
        Ok(Value::Object(body)) => check(body),
        Ok(other) => fail(
            assertion,
            Actual::NotAnObject {
                key: None,
                value: other.clone(),
            },
        ),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn assert_status(assertion: &Assertion, expected: StatusCode, got: StatusCode) -> AssertResult {
    verdict(assertion, expected == got, Actual::Status(got))
}

fn assert_header_prefix(
    assertion: &Assertion,
    name: &HeaderName,
    prefix: &str,
    headers: &HeaderMap,
) -> AssertResult {
    let value = headers
        .get(name)
        .map(|v| v.to_str().unwrap_or("<invalid utf8>").to_owned());

    let ok = value.as_deref().is_some_and(|v| v.starts_with(prefix));

    verdict(
        assertion,
        ok,
        Actual::Header {
            name: name.clone(),
            value,
        },
    )
}

fn assert_stable(
    assertion: &Assertion,
    keys: &[String],
    responses: &[&CapturedResponse],
) -> AssertResult {
    let Some((first, rest)) = responses.split_first() else {
        return fail(assertion, Actual::Consistent(0));
    };

    for (i, other) in rest.iter().enumerate() {
        let attempt = i + 2;

        if other.status != first.status {
            return fail(
                assertion,
                Actual::Diverged {
                    what: "status".into(),
                    attempt,
                    first: first.status.to_string(),
                    other: other.status.to_string(),
                },
            );
        }

        for key in keys {
            let a = lookup(first, key);
            let b = lookup(other, key);
            let same = match (a, b) {
                (Some(a), Some(b)) => json_eq(a, b),
                (a, b) => a == b,
            };
            if !same {
                return fail(
                    assertion,
                    Actual::Diverged {
                        what: format!("`{key}` ="),
                        attempt,
                        first: describe(a),
                        other: describe(b),
                    },
                );
            }
        }
    }

    pass(assertion, Actual::Consistent(responses.len()))
}

/// `==` on JSON values, except that numbers compare by value: `1`, `1.0`
/// and `1e0` are all equal.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                a == b
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                a == b
            } else {
                a.as_f64() == b.as_f64()
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| json_eq(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, a)| b.get(key).is_some_and(|b| json_eq(a, b)))
        }
        _ => a == b,
    }
}

fn lookup<'a>(response: &'a CapturedResponse, key: &str) -> Option<&'a Value> {
    response.body_json.as_ref().ok()?.as_object()?.get(key)
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "<missing>".into(), |v| v.to_string())
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use reqwest::Method;
    use reqwest::StatusCode;
    use reqwest::header::CONTENT_TYPE;
    use reqwest::header::HeaderMap;
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use url::Url;

    use crate::asserter::Actual;
    use crate::asserter::Assert;
    use crate::asserter::Asserter;
    use crate::asserter::ContractOutcome;
    use crate::asserter::TestResult;
    use crate::runner::CapturedResponse;
    use crate::runner::RequestFailure;
    use crate::runner::RunnerResult;
    use crate::validator::Assertion;

    fn json_response(status: StatusCode, body: &str) -> CapturedResponse {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        CapturedResponse::new(status, headers, body.into())
    }

    fn result(
        responses: Vec<CapturedResponse>,
        assertions: Vec<Assertion>,
    ) -> RunnerResult {
        RunnerResult {
            name: "contract".into(),
            method: Method::GET,
            url: Url::parse("http://test.com/users/1").unwrap(),
            attempts: responses.into_iter().map(Ok).collect(),
            assertions,
        }
    }

    #[test]
    fn assert_status_test() {
        let outcome = result(
            vec![json_response(StatusCode::NOT_FOUND, "{}")],
            vec![Assertion::Status(StatusCode::OK)],
        )
        .assert();

        assert_eq!(outcome[0].status, TestResult::Fail);
        assert_eq!(outcome[0].actual, Actual::Status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn assert_content_type_prefix() {
        let prefix = Assertion::HeaderPrefix {
            name: CONTENT_TYPE,
            prefix: "application/json".into(),
        };

        let ok = result(vec![json_response(StatusCode::OK, "{}")], vec![prefix.clone()]).assert();
        assert_eq!(ok[0].status, TestResult::Pass);

        let missing = result(
            vec![CapturedResponse::new(StatusCode::OK, HeaderMap::new(), "{}".into())],
            vec![prefix],
        )
        .assert();
        assert_eq!(missing[0].status, TestResult::Fail);
        assert_eq!(
            missing[0].actual,
            Actual::Header {
                name: CONTENT_TYPE,
                value: None
            }
        );
    }

    #[test]
    fn assert_json_keys_and_values() {
        let outcome = result(
            vec![json_response(StatusCode::OK, r#"{"id": 2, "name": "Ada"}"#)],
            vec![
                Assertion::JsonKeys(vec!["id".into(), "email".into()]),
                Assertion::JsonEquals {
                    key: "id".into(),
                    value: json!(1),
                },
            ],
        )
        .assert();

        assert_eq!(outcome[0].actual, Actual::MissingKeys(vec!["email".into()]));
        assert_eq!(
            outcome[1].actual,
            Actual::Value {
                key: "id".into(),
                value: Some(json!(2))
            }
        );
        assert!(outcome.iter().all(|r| r.status == TestResult::Fail));
    }

    #[test]
    fn assert_non_empty_envelope() {
        let outcome = result(
            vec![json_response(
                StatusCode::NOT_FOUND,
                r#"{"error": "not_found", "message": ""}"#,
            )],
            vec![Assertion::JsonNonEmpty(vec!["error".into(), "message".into()])],
        )
        .assert();

        assert_eq!(outcome[0].status, TestResult::Fail);
        assert_eq!(outcome[0].actual, Actual::EmptyKeys(vec!["message".into()]));
    }

    #[test]
    fn assert_nested_error_fields() {
        let nested = Assertion::NestedKeys {
            key: "errors".into(),
            fields: vec!["email".into(), "password".into()],
        };

        let outcome = result(
            vec![json_response(
                StatusCode::BAD_REQUEST,
                r#"{"errors": {"email": "is required"}}"#,
            )],
            vec![nested.clone()],
        )
        .assert();
        assert_eq!(
            outcome[0].actual,
            Actual::MissingKeys(vec!["errors.password".into()])
        );

        let not_object = result(
            vec![json_response(
                StatusCode::BAD_REQUEST,
                r#"{"errors": ["email"]}"#,
            )],
            vec![nested],
        )
        .assert();
        assert_eq!(
            not_object[0].actual,
            Actual::NotAnObject {
                key: Some("errors".into()),
                value: json!(["email"])
            }
        );
    }

    #[test]
    fn malformed_json_fails_json_assertions_only() {
        let outcome = result(
            vec![CapturedResponse::new(
                StatusCode::OK,
                HeaderMap::new(),
                "<html>oops</html>".into(),
            )],
            vec![
                Assertion::Status(StatusCode::OK),
                Assertion::JsonKeys(vec!["id".into()]),
            ],
        )
        .assert();

        assert_eq!(outcome[0].status, TestResult::Pass);
        assert_eq!(outcome[1].status, TestResult::Fail);
        assert!(matches!(outcome[1].actual, Actual::MalformedJson(_)));
    }

    #[test]
    fn request_failure_is_reported_once() {
        let url = Url::parse("http://test.com/users/1").unwrap();
        let runner_result = RunnerResult {
            name: "down".into(),
            method: Method::GET,
            url: url.clone(),
            attempts: vec![Err(RequestFailure::Timeout {
                url,
                timeout: std::time::Duration::from_secs(10),
            })],
            assertions: vec![
                Assertion::Status(StatusCode::OK),
                Assertion::JsonKeys(vec!["id".into()]),
            ],
        };

        let outcome = runner_result.assert();

        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome[0].expected, Assertion::Reachable);
        assert!(matches!(
            outcome[0].actual,
            Actual::RequestFailed(RequestFailure::Timeout { .. })
        ));
    }

    #[test]
    fn later_attempt_failure_is_reported() {
        let outcome = result(
            vec![
                json_response(StatusCode::OK, r#"{"id": 1}"#),
                json_response(StatusCode::OK, r#"{"id": 3}"#),
            ],
            vec![
                Assertion::JsonEquals {
                    key: "id".into(),
                    value: json!(1),
                },
                Assertion::Stable {
                    keys: vec!["id".into()],
                },
            ],
        )
        .assert();

        assert_eq!(outcome[0].status, TestResult::Fail);
        assert_eq!(
            outcome[0].actual,
            Actual::Value {
                key: "id".into(),
                value: Some(json!(3))
            }
        );
        assert_eq!(outcome[1].status, TestResult::Fail);
        assert_eq!(
            outcome[1].actual,
            Actual::Diverged {
                what: "`id` =".into(),
                attempt: 2,
                first: "1".into(),
                other: "3".into(),
            }
        );
    }

    #[test]
    fn numbers_compare_by_value() {
        let outcome = result(
            vec![
                json_response(StatusCode::OK, r#"{"id": 1.0, "tags": [2.0]}"#),
                json_response(StatusCode::OK, r#"{"id": 1, "tags": [2]}"#),
            ],
            vec![
                Assertion::JsonEquals {
                    key: "id".into(),
                    value: json!(1),
                },
                Assertion::JsonEquals {
                    key: "tags".into(),
                    value: json!([2]),
                },
                Assertion::Stable {
                    keys: vec!["id".into(), "tags".into()],
                },
            ],
        )
        .assert();

        assert!(outcome.iter().all(|r| r.status == TestResult::Pass), "{outcome:#?}");

        let string_id = result(
            vec![json_response(StatusCode::OK, r#"{"id": "1"}"#)],
            vec![Assertion::JsonEquals {
                key: "id".into(),
                value: json!(1),
            }],
        )
        .assert();

        assert_eq!(string_id[0].status, TestResult::Fail);
    }

    #[test]
    fn status_change_between_attempts_breaks_stability() {
        let outcome = result(
            vec![
                json_response(StatusCode::NOT_FOUND, r#"{"error": "not_found"}"#),
                json_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": "not_found"}"#),
            ],
            vec![Assertion::Stable {
                keys: vec!["error".into()],
            }],
        )
        .assert();

        assert_eq!(
            outcome[0].actual,
            Actual::Diverged {
                what: "status".into(),
                attempt: 2,
                first: "404 Not Found".into(),
                other: "500 Internal Server Error".into(),
            }
        );
    }

    #[test]
    fn contract_without_assertions_fails() {
        let outcome = result(vec![json_response(StatusCode::OK, "{}")], vec![]).assert();

        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome[0].status, TestResult::Fail);
        assert_eq!(outcome[0].expected, Assertion::HasExpectations);
        assert_eq!(outcome[0].actual, Actual::NoAssertions);
    }

    #[test]
    fn contract_without_attempts_fails() {
        let outcome = result(vec![], vec![Assertion::Status(StatusCode::OK)]).assert();

        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome[0].status, TestResult::Fail);
        assert_eq!(outcome[0].expected, Assertion::Reachable);
        assert_eq!(outcome[0].actual, Actual::NoAttempts);
    }

    #[test]
    fn outcome_without_results_does_not_pass() {
        let outcome = ContractOutcome {
            name: "empty".into(),
            method: "GET".into(),
            path: "/users/1".into(),
            results: Arc::from([]),
        };

        assert!(!outcome.passed());
    }

    #[test]
    fn stable_across_identical_attempts() {
        let outcome = result(
            vec![
                json_response(StatusCode::OK, r#"{"id": 1}"#),
                json_response(StatusCode::OK, r#"{"id": 1}"#),
            ],
            vec![Assertion::Stable {
                keys: vec!["id".into()],
            }],
        )
        .assert();

        assert_eq!(outcome[0].status, TestResult::Pass);
        assert_eq!(outcome[0].actual, Actual::Consistent(2));
    }

    #[tokio::test]
    async fn test_full() {
        let (runner_tx, asserter_rx) = flume::unbounded::<RunnerResult>();
        let (asserter_tx, outputter_rx) = flume::unbounded::<ContractOutcome>();

        tokio::spawn(async move {
            Asserter::run(asserter_rx, asserter_tx).await.unwrap();
        });

        runner_tx
            .send_async(result(
                vec![json_response(StatusCode::OK, r#"{"id": 1, "name": "Ada"}"#)],
                vec![
                    Assertion::Status(StatusCode::OK),
                    Assertion::HeaderPrefix {
                        name: CONTENT_TYPE,
                        prefix: "application/json".into(),
                    },
                    Assertion::JsonEquals {
                        key: "id".into(),
                        value: json!(1),
                    },
                ],
            ))
            .await
            .unwrap();

        let outcome = outputter_rx.recv_async().await.unwrap();
        assert_eq!(outcome.name, "contract");
        assert_eq!(outcome.path, "/users/1");
        assert_eq!(outcome.method, "GET");
        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.passed());
    }
}
