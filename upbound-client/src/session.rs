//! Login and session caching.
//!
//! A personal access token is exchanged for a session cookie via
//! `POST /v1/login`. Sessions are reused across reconciles through a
//! [`SessionCache`] that is handed to whoever builds clients, so there is no
//! hidden process-wide state.

use crate::client::{Client, SESSION_COOKIE, api_error};
use crate::error::{ClientError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Sessions closer than this to their expiry are refreshed.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 10 * 60;

/// Body of a login request.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    id: &'a str,
    password: &'a str,
    remember: bool,
}

/// The registered claims this crate reads from Upbound tokens.
#[derive(Debug, Default, Deserialize)]
struct Claims {
    #[serde(default)]
    jti: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode the claims of a JWT without verifying its signature.
fn unverified_claims(token: &str) -> Result<Claims> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => {
            return Err(ClientError::InvalidToken(
                "token is not a JWT".to_string(),
            ));
        }
    };

    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ClientError::InvalidToken(format!("malformed payload: {}", e)))?;

    Ok(serde_json::from_slice(&bytes)?)
}

/// Extract the user ID (`jti` claim) from a personal access token.
pub fn token_user_id(token: &str) -> Result<String> {
    unverified_claims(token)?
        .jti
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ClientError::InvalidToken("no user id in personal access token".into()))
}

/// Expiry (unix seconds) of a session token, if it is a JWT carrying one.
fn session_expiry(session: &str) -> Option<i64> {
    unverified_claims(session)
        .ok()
        .and_then(|claims| claims.exp)
        .filter(|exp| *exp > 0)
}

impl Client {
    /// Exchange a personal access token for a session token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidToken`] if the token carries no user id,
    /// and [`ClientError::Auth`] if the response sets no session cookie.
    pub async fn login(&self, token: &str) -> Result<String> {
        let id = token_user_id(token)?;
        let body = LoginRequest {
            id: &id,
            password: token,
            remember: true,
        };

        let response = self
            .http()
            .post(self.login_url()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            return Err(ClientError::Auth(err.to_string()));
        }

        let session = response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|cookie| cookie.split(';').next())
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.to_string());

        match session {
            Some(session) if !session.is_empty() => {
                tracing::debug!(user = %id, "Logged in to Upbound");
                Ok(session)
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ClientError::Auth(format!(
                    "unable to parse session cookie: {}",
                    body
                )))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSession {
    session: String,
    expires_at: Option<i64>,
}

impl CachedSession {
    fn is_fresh(&self, now: i64, margin: i64) -> bool {
        match self.expires_at {
            Some(exp) => now <= exp - margin,
            None => true,
        }
    }
}

/// Cache of login sessions keyed by a fingerprint of endpoint and token.
///
/// Share it behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct SessionCache {
    entries: RwLock<HashMap<String, CachedSession>>,
    refresh_margin_secs: i64,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCache {
    /// Create an empty cache with the default refresh margin.
    pub fn new() -> Self {
        Self::with_refresh_margin(DEFAULT_REFRESH_MARGIN_SECS)
    }

    /// Create an empty cache that refreshes sessions `secs` before expiry.
    pub fn with_refresh_margin(secs: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            refresh_margin_secs: secs,
        }
    }

    fn fingerprint(endpoint: &str, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(endpoint.as_bytes());
        hasher.update([0u8]);
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Return a usable session for `token`, logging in when none is cached
    /// or the cached one is about to expire.
    ///
    /// # Errors
    ///
    /// Returns the login error when a fresh session is needed and login
    /// fails.
    pub async fn get_or_login(&self, client: &Client, token: &str) -> Result<String> {
        let key = Self::fingerprint(client.base_url(), token);
        let now = chrono::Utc::now().timestamp();

        let cached = self
            .entries
            .read()
            .await
            .get(&key)
            .filter(|entry| entry.is_fresh(now, self.refresh_margin_secs))
            .map(|entry| entry.session.clone());

        if let Some(session) = cached {
            return Ok(session);
        }

        tracing::debug!(endpoint = %client.base_url(), "No fresh session cached, logging in");
        let session = client.login(token).await?;
        let entry = CachedSession {
            expires_at: session_expiry(&session),
            session: session.clone(),
        };
        self.entries.write().await.insert(key, entry);

        Ok(session)
    }

    /// Drop the cached session for `token`, e.g. after the API rejected it.
    pub async fn invalidate(&self, endpoint: &str, token: &str) {
        let key = Self::fingerprint(endpoint, token);
        if self.entries.write().await.remove(&key).is_some() {
            tracing::debug!(endpoint = %endpoint, "Invalidated cached session");
        }
    }

    /// Number of cached sessions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(claims: serde_json::Value) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.sig",
            engine.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
            engine.encode(claims.to_string())
        )
    }

    #[test]
    fn token_user_id_reads_jti() {
        let token = jwt(serde_json::json!({"jti": "user-123"}));
        assert_eq!(token_user_id(&token).unwrap(), "user-123");
    }

    #[test]
    fn token_without_jti_is_rejected() {
        let token = jwt(serde_json::json!({"sub": "someone"}));
        assert!(matches!(
            token_user_id(&token),
            Err(ClientError::InvalidToken(_))
        ));
        assert!(token_user_id("not-a-jwt").is_err());
    }

    #[test]
    fn session_expiry_ignores_opaque_sessions() {
        assert_eq!(session_expiry("opaque-session"), None);
        assert_eq!(
            session_expiry(&jwt(serde_json::json!({"exp": 1700000000}))),
            Some(1700000000)
        );
        assert_eq!(session_expiry(&jwt(serde_json::json!({"exp": 0}))), None);
    }

    #[test]
    fn freshness_respects_margin() {
        let entry = CachedSession {
            session: "s".into(),
            expires_at: Some(1_000),
        };
        assert!(entry.is_fresh(399, 600));
        assert!(entry.is_fresh(400, 600));
        assert!(!entry.is_fresh(401, 600));

        let opaque = CachedSession {
            session: "s".into(),
            expires_at: None,
        };
        assert!(opaque.is_fresh(i64::MAX, 600));
    }

    #[test]
    fn fingerprint_depends_on_endpoint_and_token() {
        let a = SessionCache::fingerprint("https://api.upbound.io", "token");
        let b = SessionCache::fingerprint("https://api.example.com", "token");
        let c = SessionCache::fingerprint("https://api.upbound.io", "other");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
