//! HTTP surface: routing, session gating, and status mapping.
//!
//! The router exposes the auth and file APIs under `/api` and optionally
//! serves static assets at `/`. Handlers hold no state of their own; they
//! share one [`AppState`] with the vault, the token signer, and the
//! authenticator, all constructed once at startup.

pub mod auth_routes;
pub mod error;
pub mod files_routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::services::ServeDir;
use vault::Vault;

use crate::auth::{Authenticator, TokenSigner, SESSION_COOKIE};
use error::{ApiError, ApiResult};

/// Shared state for all handlers.
pub struct AppState {
    /// The confined home tree.
    pub vault: Arc<Vault>,
    /// Session token signer.
    pub signer: TokenSigner,
    /// Credential verifier.
    pub authenticator: Arc<dyn Authenticator>,
    /// Maximum session age in seconds.
    pub session_lifetime: u64,
    /// Mark session cookies as requiring a secure transport.
    pub secure_cookies: bool,
    /// Upload ceiling in bytes.
    pub upload_max_size: u64,
}

/// Shared-state handle passed to handlers.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Extracts and verifies the session cookie, returning the identity.
    pub fn require_session(&self, headers: &HeaderMap) -> ApiResult<String> {
        let token = session_cookie(headers)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
        self.signer
            .verify(&token, self.session_lifetime)
            .ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))
    }
}

/// Builds the application router.
pub fn router(state: SharedState, static_dir: Option<PathBuf>) -> Router {
    let app = Router::new()
        .route("/api/auth/login", post(auth_routes::login))
        .route("/api/auth/logout", post(auth_routes::logout))
        .route("/api/auth/me", get(auth_routes::me))
        .route(
            "/api/files",
            get(files_routes::list).delete(files_routes::delete),
        )
        .route("/api/files/info", get(files_routes::info))
        .route("/api/files/content", get(files_routes::content))
        .route("/api/files/download", get(files_routes::download))
        .route(
            "/api/files/upload",
            // The vault enforces the configured ceiling chunk by chunk.
            post(files_routes::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/files/mkdir", post(files_routes::mkdir))
        .route("/api/files/rename", put(files_routes::rename))
        .with_state(state);

    match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    }
}

/// Pulls the session token out of the Cookie header, if present.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_cookie_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=tok123; lang=en"),
        );
        assert_eq!(session_cookie(&headers), Some("tok123".to_string()));
    }

    #[test]
    fn test_session_cookie_absent() {
        let headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_cookie(&headers), None);
    }
}
