use clap::Parser;
use serde_json::Value;

use crate::config::BASE_URL_ENV;
use crate::config::DEFAULT_BASE_URL;
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::config::TIMEOUT_ENV;
use crate::config::TOKEN_ENV;
use crate::contracts::UserFixtures;

/// Checks a User API against its documented request/response contracts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the users collection, e.g. https://api.example.com/users
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Token sent as `Authorization: Bearer <token>`
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Seconds to wait for each response before failing the contract
    #[arg(
        long,
        env = TIMEOUT_ENV,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// TOML file with contracts to run instead of the built-in ones
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Id of a user that exists
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub existing_id: i64,

    /// Id of a user that does not exist
    #[arg(long, default_value_t = 999_999, allow_negative_numbers = true)]
    pub missing_id: i64,

    /// JSON body of the create request, missing at least one required field
    #[arg(long, default_value = r#"{"name":"Deepthi"}"#, value_parser = parse_json)]
    pub create_body: Value,

    /// Field the create request is expected to report under `errors`
    #[arg(long = "missing-field", default_values_t = vec![String::from("email")])]
    pub missing_fields: Vec<String>,
}

impl Cli {
    pub fn fixtures(&self) -> UserFixtures {
        UserFixtures {
            existing_id: self.existing_id,
            missing_id: self.missing_id,
            incomplete_body: self.create_body.clone(),
            missing_fields: self.missing_fields.clone(),
        }
    }
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("not valid JSON: {e}"))
}
