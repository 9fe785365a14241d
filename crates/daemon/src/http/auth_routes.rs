//! Login, logout, and session introspection.

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{ApiError, ApiResult};
use super::SharedState;
use crate::auth::SESSION_COOKIE;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<SharedState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Response> {
    if !state.authenticator.authenticate(&body.username, &body.password) {
        info!(username = %body.username, "failed login attempt");
        return Err(ApiError::auth_failed());
    }

    let token = state.signer.issue(&body.username);
    let cookie = session_cookie_value(&token, state.secure_cookies);

    let mut response = Json(json!({"username": body.username})).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|_| ApiError::internal())?,
    );
    info!(username = %body.username, "login");
    Ok(response)
}

/// POST /api/auth/logout
pub async fn logout() -> ApiResult<Response> {
    let mut response = Json(json!({"ok": true})).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0"
        ))
        .map_err(|_| ApiError::internal())?,
    );
    Ok(response)
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let username = state.require_session(&headers)?;
    Ok(Json(json!({"username": username})))
}

fn session_cookie_value(token: &str, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_plain() {
        let cookie = session_cookie_value("tok", false);
        assert_eq!(cookie, "session=tok; Path=/; HttpOnly; SameSite=Strict");
    }

    #[test]
    fn test_cookie_value_secure() {
        let cookie = session_cookie_value("tok", true);
        assert!(cookie.ends_with("; Secure"));
    }
}
