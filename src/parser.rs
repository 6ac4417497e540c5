use std::collections::BTreeMap;

use serde::Deserialize;

/// A contract suite as written in a TOML file.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Suite {
    pub contracts: Vec<Case>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Case {
    pub name: String,
    pub method: String,
    #[serde(default)]
    pub path: String,
    pub attempts: Option<u32>,
    pub headers: Option<toml::Value>,
    pub body: Option<serde_json::Value>,
    pub expect: Expect,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Expect {
    pub status: Option<i64>,
    pub content_type: Option<String>,
    pub keys: Option<Vec<String>>,
    pub non_empty: Option<Vec<String>>,
    pub fields: Option<serde_json::Map<String, serde_json::Value>>,
    pub nested_keys: Option<BTreeMap<String, Vec<String>>>,
}

#[cfg(test)]
mod test {
    use crate::parser::Suite;

    #[test]
    fn parses_full_case() {
        let src = r#"
            [[contracts]]
            name = "fetch existing user"
            method = "GET"
            path = "/1"
            attempts = 2
            headers = { X-Trace = "abc" }

            [contracts.expect]
            status = 200
            content_type = "application/json"
            keys = ["id"]
            fields = { id = 1 }

            [[contracts]]
            name = "create user without email"
            method = "POST"
            body = { name = "Deepthi" }

            [contracts.expect]
            status = 400
            nested_keys = { errors = ["email"] }
        "#;

        let suite: Suite = toml::from_str(src).unwrap();

        assert_eq!(suite.contracts.len(), 2);

        let fetch = &suite.contracts[0];
        assert_eq!(fetch.path, "/1");
        assert_eq!(fetch.attempts, Some(2));
        assert_eq!(fetch.expect.status, Some(200));
        assert_eq!(
            fetch.expect.fields.as_ref().unwrap().get("id"),
            Some(&serde_json::json!(1))
        );

        let create = &suite.contracts[1];
        assert_eq!(create.path, "");
        assert_eq!(create.body, Some(serde_json::json!({ "name": "Deepthi" })));
        assert_eq!(
            create.expect.nested_keys.as_ref().unwrap()["errors"],
            vec!["email".to_string()]
        );
    }

    #[test]
    fn unknown_expectation_is_an_error() {
        let src = r#"
            [[contracts]]
            name = "typo"
            method = "GET"

            [contracts.expect]
            statuss = 200
        "#;

        assert!(toml::from_str::<Suite>(src).is_err());
    }
}
