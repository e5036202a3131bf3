//! Authentication module for the login gate.
//!
//! Provides:
//! - Credential verification against a configured store
//! - Signed session tokens carried in a cookie
//! - Cookie header helpers

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::digest::{CtOutput, Output};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const SECONDS_PER_DAY: u64 = 86_400;

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Session claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    /// Session identifier.
    pub sid: Uuid,
    /// Issued at time (Unix timestamp).
    pub iat: u64,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
}

impl Claims {
    /// Creates claims valid for `ttl_secs` from now.
    pub fn new(sub: impl Into<String>, ttl_secs: u64) -> Self {
        let now = now_secs();
        Self {
            sub: sub.into(),
            sid: Uuid::new_v4(),
            iat: now,
            exp: now.saturating_add(ttl_secs),
        }
    }

    /// Checks if the session is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp < now_secs()
    }
}

/// Hex SHA-256 digest of a password, the form kept in credential files.
#[must_use]
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Username to password-digest table.
///
/// Stored as JSON: `{"users": {"alice": "<sha256 hex>"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStore {
    #[serde(default)]
    users: HashMap<String, String>,
}

impl CredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user with a plain-text password, stored hashed.
    #[must_use]
    pub fn with_user(mut self, username: impl Into<String>, password: &str) -> Self {
        self.users.insert(username.into(), hash_password(password));
        self
    }

    /// Loads a store from a JSON file.
    ///
    /// # Errors
    /// Returns [`AuthError::Config`] if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| AuthError::Config(format!("{}: {e}", path.display())))
    }

    /// Checks a username/password pair. Digests are compared in constant time.
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Some(stored) = self.users.get(username).and_then(|d| hex::decode(d).ok()) else {
            return false;
        };
        if stored.len() != <Sha256 as Digest>::output_size() {
            return false;
        }
        let stored = CtOutput::<Sha256>::new(Output::<Sha256>::clone_from_slice(&stored));
        stored == CtOutput::new(Sha256::digest(password.as_bytes()))
    }

    /// Number of configured users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no user is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC key signing session tokens.
    pub signing_key: String,
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Session lifetime in days.
    pub cookie_expiry_days: u64,
    /// Accepted credentials.
    pub credentials: CredentialStore,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: "change-me".to_string(),
            cookie_name: "btlens_session".to_string(),
            cookie_expiry_days: 30,
            credentials: CredentialStore::new(),
        }
    }
}

impl AuthConfig {
    /// Builds the configuration from the environment.
    ///
    /// Reads `BTLENS_SIGNING_KEY` (required), `BTLENS_COOKIE_NAME`,
    /// `BTLENS_COOKIE_EXPIRY_DAYS` and the credential file named by
    /// `BTLENS_CREDENTIALS_FILE` (default `credentials.json`).
    ///
    /// # Errors
    /// Returns [`AuthError::Config`] for a missing key, an invalid day count or
    /// an unreadable credential file.
    pub fn from_env() -> Result<Self, AuthError> {
        let defaults = Self::default();
        let signing_key = env::var("BTLENS_SIGNING_KEY")
            .map_err(|_| AuthError::Config("BTLENS_SIGNING_KEY must be set".to_string()))?;
        let cookie_name = env::var("BTLENS_COOKIE_NAME").unwrap_or(defaults.cookie_name);
        let cookie_expiry_days = match env::var("BTLENS_COOKIE_EXPIRY_DAYS") {
            Ok(days) => days.parse().map_err(|_| {
                AuthError::Config(format!("BTLENS_COOKIE_EXPIRY_DAYS is not a number: {days}"))
            })?,
            Err(_) => defaults.cookie_expiry_days,
        };
        let credentials_file =
            env::var("BTLENS_CREDENTIALS_FILE").unwrap_or_else(|_| "credentials.json".to_string());
        let credentials = CredentialStore::from_json_file(&credentials_file)?;
        info!(
            users = credentials.len(),
            file = %credentials_file,
            "Credential store loaded"
        );

        Ok(Self {
            signing_key,
            cookie_name,
            cookie_expiry_days,
            credentials,
        })
    }
}

/// Authentication state shared across handlers.
#[derive(Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
}

impl AuthState {
    /// Creates a new authentication state.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Verifies credentials and issues a session token.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidCredentials`] on a wrong username or password.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if !self.config.credentials.verify(username, password) {
            warn!(username = %username, "Rejected login");
            return Err(AuthError::InvalidCredentials);
        }
        debug!(username = %username, "Login accepted");
        self.create_token(username)
    }

    /// Checks credentials without issuing a token.
    #[must_use]
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        self.config.credentials.verify(username, password)
    }

    /// Creates a signed session token for a user.
    ///
    /// # Errors
    /// Returns [`AuthError::TokenCreationFailed`] if the claims cannot be
    /// serialised or signed.
    pub fn create_token(&self, username: &str) -> Result<String, AuthError> {
        let claims = Claims::new(username, self.ttl_secs());
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims).map_err(|_| AuthError::TokenCreationFailed)?,
        );
        let signature = self.sign(&payload).ok_or(AuthError::TokenCreationFailed)?;
        Ok(format!("{payload}.{signature}"))
    }

    /// Validates a session token and returns its claims.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidToken`] for malformed or tampered tokens and
    /// [`AuthError::TokenExpired`] for expired ones.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::InvalidToken)?;

        let mut mac = HmacSha256::new_from_slice(self.config.signing_key.as_bytes())
            .map_err(|_| AuthError::InvalidToken)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let decoded = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: Claims =
            serde_json::from_slice(&decoded).map_err(|_| AuthError::InvalidToken)?;

        if claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    /// Name of the session cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// `Set-Cookie` value carrying `token`.
    #[must_use]
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.config.cookie_name,
            token,
            self.ttl_secs()
        )
    }

    /// `Set-Cookie` value that removes the session cookie.
    #[must_use]
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
            self.config.cookie_name
        )
    }

    /// Validates the session cookie found in `headers`.
    ///
    /// # Errors
    /// Returns [`AuthError::MissingSession`] without a cookie, otherwise the
    /// errors of [`AuthState::validate`].
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token =
            extract_cookie(headers, &self.config.cookie_name).ok_or(AuthError::MissingSession)?;
        self.validate(&token)
    }

    fn ttl_secs(&self) -> u64 {
        self.config.cookie_expiry_days.saturating_mul(SECONDS_PER_DAY)
    }

    fn sign(&self, payload: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(self.config.signing_key.as_bytes()).ok()?;
        mac.update(payload.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Finds cookie `name` across every `Cookie` header.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Wrong username or password.
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// No session cookie.
    #[error("Missing session")]
    MissingSession,
    /// Invalid token format or signature.
    #[error("Invalid session token")]
    InvalidToken,
    /// Session has expired.
    #[error("Session expired")]
    TokenExpired,
    /// Token creation failed.
    #[error("Failed to create session")]
    TokenCreationFailed,
    /// Invalid authentication configuration.
    #[error("Authentication configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::MissingSession => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::TokenCreationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn state(days: u64) -> AuthState {
        AuthState::new(AuthConfig {
            signing_key: "test-key".to_string(),
            cookie_name: "session".to_string(),
            cookie_expiry_days: days,
            credentials: CredentialStore::new()
                .with_user("user1", "password1")
                .with_user("user2", "password2"),
        })
    }

    #[test]
    fn test_claims_expiry() {
        let valid = Claims::new("user1", 3600);
        assert!(!valid.is_expired());
        assert_eq!(valid.exp - valid.iat, 3600);

        let mut expired = Claims::new("user1", 0);
        expired.exp = expired.iat - 1;
        assert!(expired.is_expired());
    }

    #[test]
    fn test_credentials() {
        let store = CredentialStore::new().with_user("user1", "password1");
        assert!(store.verify("user1", "password1"));
        assert!(!store.verify("user1", "password2"));
        assert!(!store.verify("nobody", "password1"));
        assert_eq!(hash_password("abc").len(), 64);
    }

    #[test]
    fn test_credentials_digest_forms() {
        let upper = hash_password("password1").to_uppercase();
        let json = format!(
            r#"{{"users": {{"upper": "{upper}", "short": "abcd", "junk": "not-hex"}}}}"#
        );
        let store: CredentialStore = serde_json::from_str(&json).unwrap();
        assert!(store.verify("upper", "password1"));
        assert!(!store.verify("upper", "password2"));
        assert!(!store.verify("short", "password1"));
        assert!(!store.verify("junk", "password1"));
    }

    #[test]
    fn test_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let json = format!(r#"{{"users": {{"alice": "{}"}}}}"#, hash_password("s3cret"));
        std::fs::write(&path, json).unwrap();

        let store = CredentialStore::from_json_file(&path).unwrap();
        assert!(store.verify("alice", "s3cret"));
        assert!(matches!(
            CredentialStore::from_json_file(dir.path().join("absent.json")),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn test_login_and_validate() {
        let auth = state(30);
        assert_eq!(
            auth.login("user1", "wrong"),
            Err(AuthError::InvalidCredentials)
        );

        let token = auth.login("user2", "password2").unwrap();
        let claims = auth.validate(&token).unwrap();
        assert_eq!(claims.sub, "user2");
        assert_eq!(claims.exp - claims.iat, 30 * SECONDS_PER_DAY);
    }

    #[test]
    fn test_tampered_token() {
        let auth = state(30);
        let token = auth.create_token("user1").unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged_claims = Claims::new("user2", 3600);
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{forged_payload}.{signature}");
        assert_eq!(auth.validate(&forged), Err(AuthError::InvalidToken));
        assert_eq!(auth.validate("garbage"), Err(AuthError::InvalidToken));

        let other_key = AuthState::new(AuthConfig {
            signing_key: "other".to_string(),
            ..AuthConfig::default()
        });
        assert_eq!(other_key.validate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token() {
        let auth = state(0);
        let token = auth.create_token("user1").unwrap();
        // exp == iat; wait past it
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(auth.validate(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_cookie_extraction() {
        let auth = state(1);
        let token = auth.create_token("user1").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; session={token}")).unwrap(),
        );
        assert_eq!(extract_cookie(&headers, "session"), Some(token.clone()));
        assert_eq!(auth.authenticate(&headers).unwrap().sub, "user1");

        assert_eq!(
            auth.authenticate(&HeaderMap::new()),
            Err(AuthError::MissingSession)
        );
        assert!(auth.session_cookie(&token).contains("Max-Age=86400"));
        assert!(auth.clear_cookie().starts_with("session=;"));
    }
}
