use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::auth::dto::TokenResponse;
use crate::session::error::SessionError;
use crate::users::dto::UserOut;

/// The slice of the REST surface the session flow needs. Injected so the
/// state machine can be driven against mocks.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, SessionError>;
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserOut, SessionError>;
    async fn current_user(&self, token: &str) -> Result<UserOut, SessionError>;
}

/// Speaks to the real backend under its `/api` prefix.
pub struct HttpAuthBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn map_transport_error(e: reqwest::Error) -> SessionError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        SessionError::Network
    } else {
        SessionError::Unexpected(e.to_string())
    }
}

/// Translates an error response into the session taxonomy. FastAPI-style
/// bodies carry either `{"detail": "..."}` or a list of field errors.
fn map_error_response(status: StatusCode, body: Value) -> SessionError {
    if status == StatusCode::UNAUTHORIZED {
        return SessionError::InvalidCredentials;
    }
    match body.get("detail") {
        Some(Value::String(detail)) => SessionError::Rejected(detail.clone()),
        Some(Value::Array(items)) => {
            let pairs: Vec<(String, String)> = items
                .iter()
                .map(|item| {
                    let field = item
                        .get("loc")
                        .and_then(|loc| loc.as_array())
                        .and_then(|loc| loc.get(1))
                        .and_then(|f| f.as_str())
                        .unwrap_or("")
                        .to_string();
                    let msg = item
                        .get("msg")
                        .and_then(|m| m.as_str())
                        .unwrap_or("invalid value")
                        .to_string();
                    (field, msg)
                })
                .collect();
            SessionError::from_field_errors(
                pairs.iter().map(|(f, m)| (f.as_str(), m.as_str())),
            )
        }
        _ => SessionError::Unexpected(format!("unexpected response ({status})")),
    }
}

async fn read_error(resp: reqwest::Response) -> SessionError {
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    map_error_response(status, body)
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, SessionError> {
        let resp = self
            .http
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(map_transport_error)?;
        if !resp.status().is_success() {
            return Err(read_error(resp).await);
        }
        resp.json::<TokenResponse>()
            .await
            .map_err(|e| SessionError::Unexpected(e.to_string()))
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserOut, SessionError> {
        let resp = self
            .http
            .post(self.url("/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .map_err(map_transport_error)?;
        if !resp.status().is_success() {
            return Err(read_error(resp).await);
        }
        resp.json::<UserOut>()
            .await
            .map_err(|e| SessionError::Unexpected(e.to_string()))
    }

    async fn current_user(&self, token: &str) -> Result<UserOut, SessionError> {
        let resp = self
            .http
            .get(self.url("/users/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_transport_error)?;
        if !resp.status().is_success() {
            return Err(read_error(resp).await);
        }
        resp.json::<UserOut>()
            .await
            .map_err(|e| SessionError::Unexpected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn a_401_becomes_invalid_credentials() {
        let err = map_error_response(StatusCode::UNAUTHORIZED, json!({"detail": "whatever"}));
        assert_eq!(err, SessionError::InvalidCredentials);
    }

    #[test]
    fn a_string_detail_is_surfaced_verbatim() {
        let err = map_error_response(
            StatusCode::BAD_REQUEST,
            json!({"detail": "Username already registered"}),
        );
        assert_eq!(err, SessionError::Rejected("Username already registered".into()));
    }

    #[test]
    fn field_errors_are_joined() {
        let err = map_error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"detail": [
                {"loc": ["body", "email"], "msg": "value is not a valid email address"},
                {"loc": ["body", "password"], "msg": "field required"}
            ]}),
        );
        assert_eq!(
            err.to_string(),
            "email: value is not a valid email address\npassword: field required"
        );
    }

    #[test]
    fn bodyless_errors_fall_through_to_unexpected() {
        let err = map_error_response(StatusCode::INTERNAL_SERVER_ERROR, Value::Null);
        assert!(matches!(err, SessionError::Unexpected(_)));
    }
}
