//! The built-in User API contracts.
//!
//! `GET {base}/{id}` answers with the user or a 404 error envelope, and
//! `POST {base}` rejects incomplete users with a 400 listing the offending
//! fields under `errors`.

use reqwest::Method;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use serde_json::json;

use crate::config::Config;
use crate::config::ConfigError;
use crate::validator::Assertion;
use crate::validator::Contract;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Inputs for the built-in suite.
#[derive(Debug, Clone)]
pub struct UserFixtures {
    pub existing_id: i64,
    pub missing_id: i64,
    pub incomplete_body: Value,
    pub missing_fields: Vec<String>,
}

impl Default for UserFixtures {
    fn default() -> Self {
        Self {
            existing_id: 1,
            missing_id: 999_999,
            incomplete_body: json!({ "name": "Deepthi" }),
            missing_fields: vec!["email".into()],
        }
    }
}

/// `GET {base}/{id}` returns 200, a JSON `Content-Type` and the user with the
/// requested `id`.
pub fn fetch_existing_user(config: &Config, id: i64) -> Result<Contract, ConfigError> {
    let url = config.endpoint(&format!("/{id}"))?;

    Ok(Contract::new("fetch existing user", Method::GET, url)
        .expect(Assertion::Status(StatusCode::OK))
        .expect(json_content_type())
        .expect(Assertion::JsonKeys(vec!["id".into()]))
        .expect(Assertion::JsonEquals {
            key: "id".into(),
            value: json!(id),
        }))
}

/// The same request as [`fetch_existing_user`] sent twice. Both answers must
/// agree on status and `id`.
pub fn fetch_existing_user_twice(config: &Config, id: i64) -> Result<Contract, ConfigError> {
    let mut contract = fetch_existing_user(config, id)?
        .with_attempts(2)
        .expect(Assertion::Stable {
            keys: vec!["id".into()],
        });
    contract.name = "fetch existing user twice".into();

    Ok(contract)
}

/// `GET {base}/{id}` for an unknown id returns 404 with a non-empty
/// `error`/`message` envelope.
pub fn fetch_missing_user(config: &Config, id: i64) -> Result<Contract, ConfigError> {
    let url = config.endpoint(&format!("/{id}"))?;
    let envelope = vec!["error".to_string(), "message".to_string()];

    Ok(Contract::new("fetch missing user", Method::GET, url)
        .expect(Assertion::Status(StatusCode::NOT_FOUND))
        .expect(Assertion::JsonKeys(envelope.clone()))
        .expect(Assertion::JsonNonEmpty(envelope)))
}

/// The same request as [`fetch_missing_user`] sent twice. Both answers must
/// agree on status and on the `error`/`message` envelope.
pub fn fetch_missing_user_twice(config: &Config, id: i64) -> Result<Contract, ConfigError> {
    let mut contract = fetch_missing_user(config, id)?
        .with_attempts(2)
        .expect(Assertion::Stable {
            keys: vec!["error".into(), "message".into()],
        });
    contract.name = "fetch missing user twice".into();

    Ok(contract)
}

/// `POST {base}` with `body` returns 400 and an `errors` object naming every
/// field in `missing_fields`.
pub fn create_user_missing_fields(
    config: &Config,
    body: Value,
    missing_fields: &[String],
) -> Result<Contract, ConfigError> {
    let url = config.endpoint("")?;

    Ok(
        Contract::new("create user with missing fields", Method::POST, url)
            .with_body(body)
            .expect(Assertion::Status(StatusCode::BAD_REQUEST))
            .expect(Assertion::JsonKeys(vec!["errors".into()]))
            .expect(Assertion::NestedKeys {
                key: "errors".into(),
                fields: missing_fields.to_vec(),
            }),
    )
}

pub fn user_api_suite(
    config: &Config,
    fixtures: &UserFixtures,
) -> Result<Vec<Contract>, ConfigError> {
    Ok(vec![
        fetch_existing_user(config, fixtures.existing_id)?,
        fetch_missing_user(config, fixtures.missing_id)?,
        create_user_missing_fields(
            config,
            fixtures.incomplete_body.clone(),
            &fixtures.missing_fields,
        )?,
        fetch_existing_user_twice(config, fixtures.existing_id)?,
        fetch_missing_user_twice(config, fixtures.missing_id)?,
    ])
}

fn json_content_type() -> Assertion {
    Assertion::HeaderPrefix {
        name: CONTENT_TYPE,
        prefix: JSON_CONTENT_TYPE.into(),
    }
}
