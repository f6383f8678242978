//! Cookie sessions and the logged-in user extractor.
//!
//! Sessions live in memory only: restarting the server logs everyone out.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::response::Redirect;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use specimen_core::User;

use super::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "specimen_session";

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/login/";

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Token → session map with a fixed lifetime per session.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Start a session for `user` and return its token.
    pub fn create(&self, user: &User) -> String {
        self.purge_expired();
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                user_id: user.id,
                username: user.username.clone(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        token
    }

    /// Live session for a token. Expired sessions are dropped.
    pub fn get(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token).map(|s| s.clone())?;
        if session.expires_at <= Utc::now() {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }

    fn purge_expired(&self) {
        let now = Utc::now();
        self.sessions.retain(|_, s| s.expires_at > now);
    }

    /// `Set-Cookie` value that installs a session token.
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.ttl.num_seconds()
        )
    }
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Session token from the request's `Cookie` headers, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// The logged-in user. Extracting it redirects anonymous requests to the
/// login page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = session_token(&parts.headers)
            .and_then(|token| state.sessions.get(&token))
            .ok_or_else(|| Redirect::to(LOGIN_PATH))?;
        Ok(Self {
            id: session.user_id,
            username: session.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user() -> User {
        User {
            id: 7,
            username: "ada".into(),
            password_hash: String::new(),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new(Duration::minutes(5));
        let token = store.create(&user());
        assert_eq!(store.get(&token).map(|s| s.user_id), Some(7));
        store.remove(&token);
        assert!(store.get(&token).is_none());
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let store = SessionStore::new(Duration::seconds(-1));
        let token = store.create(&user());
        assert!(store.get(&token).is_none());
        assert!(store.sessions.is_empty());
    }

    #[test]
    fn test_session_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; specimen_session=abc-123; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("specimen_session="));
        assert!(session_token(&empty).is_none());
        assert!(session_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let store = SessionStore::new(Duration::minutes(1));
        let cookie = store.cookie("tok");
        assert!(cookie.starts_with("specimen_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=60"));
        assert!(clear_cookie().contains("Max-Age=0"));
    }
}
