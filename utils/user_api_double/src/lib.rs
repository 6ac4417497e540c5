//! In-memory stand-in for the User API.
//!
//! Serves the documented contract: `GET /users/{id}` answers with the user or a
//! 404 `{error, message}` envelope, `POST /users` validates the body and answers
//! 400 `{errors: {field: message}}` when required fields are missing. State
//! lives only as long as the router, so every test gets a fresh copy.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

const REQUIRED_FIELDS: [&str; 3] = ["name", "email", "password"];
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default)]
struct Store {
    users: BTreeMap<i64, User>,
    next_id: i64,
}

#[derive(Clone, Default)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
}

impl AppState {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users: BTreeMap<i64, User> = users.into_iter().map(|u| (u.id, u)).collect();
        let next_id = users.keys().max().copied().unwrap_or(0) + 1;

        Self {
            store: Arc::new(RwLock::new(Store { users, next_id })),
        }
    }
}

pub fn seed_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
        },
        User {
            id: 2,
            name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
        },
    ]
}

/// Router seeded with [`seed_users`].
pub fn app() -> Router {
    router(AppState::with_users(seed_users()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `router` on an ephemeral port of 127.0.0.1 in a background task.
pub async fn spawn(router: Router) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router).await {
            tracing::error!(%error, "user api double stopped");
        }
    });

    Ok(addr)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let store = state.store.read().await;
    Json(store.users.values().cloned().collect())
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    // Ids are positive integers, anything else can't name a user.
    let user = match id.parse::<i64>() {
        Ok(id) if id > 0 => state.store.read().await.users.get(&id).cloned(),
        _ => None,
    };

    match user {
        Some(user) => (StatusCode::OK, Json(user)).into_response(),
        None => error_envelope(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("User {id} was not found"),
        ),
    }
}

async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            let mut errors = Map::new();
            errors.insert("body".into(), Value::String(rejection.body_text()));
            return validation_failed(errors);
        }
    };

    let new_user = match validate_new_user(&body) {
        Ok(new_user) => new_user,
        Err(errors) => return validation_failed(errors),
    };

    let mut store = state.store.write().await;

    if store.users.values().any(|u| u.email == new_user.email) {
        return error_envelope(
            StatusCode::CONFLICT,
            "conflict",
            format!("A user with email {} already exists", new_user.email),
        );
    }

    let id = store.next_id;
    store.next_id += 1;

    let user = User {
        id,
        name: new_user.name,
        email: new_user.email,
    };
    store.users.insert(id, user.clone());
    tracing::info!(id, "created user");

    (StatusCode::CREATED, Json(user)).into_response()
}

/// Checks a create request, collecting one message per invalid field.
pub fn validate_new_user(body: &Value) -> Result<NewUser, Map<String, Value>> {
    let mut errors = Map::new();

    let Some(object) = body.as_object() else {
        errors.insert("body".into(), json!("must be a JSON object"));
        return Err(errors);
    };

    let field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    for name in REQUIRED_FIELDS {
        if field(name).is_none() {
            errors.insert(name.into(), json!("is required"));
        }
    }

    if let Some(email) = field("email")
        && !email.contains('@')
    {
        errors.insert("email".into(), json!("must be a valid email address"));
    }

    if let Some(password) = field("password")
        && password.chars().count() < MIN_PASSWORD_LEN
    {
        errors.insert(
            "password".into(),
            json!(format!("must be at least {MIN_PASSWORD_LEN} characters")),
        );
    }

    match (field("name"), field("email")) {
        (Some(name), Some(email)) if errors.is_empty() => Ok(NewUser {
            name: name.to_owned(),
            email: email.to_owned(),
        }),
        _ => Err(errors),
    }
}

fn validation_failed(errors: Map<String, Value>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
}

fn error_envelope(status: StatusCode, error: &str, message: String) -> Response {
    (status, Json(json!({ "error": error, "message": message }))).into_response()
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::NewUser;
    use crate::validate_new_user;

    #[test]
    fn name_only_is_missing_email_and_password() {
        let errors = validate_new_user(&json!({ "name": "Deepthi" })).unwrap_err();

        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
        assert!(!errors.contains_key("name"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let errors =
            validate_new_user(&json!({ "name": "  ", "email": "", "password": null })).unwrap_err();

        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn malformed_email_and_short_password() {
        let errors = validate_new_user(&json!({
            "name": "Deepthi",
            "email": "deepthi.example.com",
            "password": "short"
        }))
        .unwrap_err();

        assert_eq!(errors["email"], json!("must be a valid email address"));
        assert_eq!(errors["password"], json!("must be at least 8 characters"));
    }

    #[test]
    fn non_object_body() {
        let errors = validate_new_user(&json!(["name"])).unwrap_err();

        assert!(errors.contains_key("body"));
    }

    #[test]
    fn complete_user_is_accepted() {
        let user = validate_new_user(&json!({
            "name": "Deepthi",
            "email": "deepthi@example.com",
            "password": "correct horse"
        }))
        .unwrap();

        assert_eq!(
            user,
            NewUser {
                name: "Deepthi".into(),
                email: "deepthi@example.com".into()
            }
        );
    }
}
