//! API token authentication
//!
//! # Architecture
//!
//! - Clients send `Authorization: Token <key>`
//! - Only the SHA-256 hex digest of a key is stored (`auth_tokens.token_hash`)
//! - Keys are issued by the identity component (or the `create-user`
//!   operator command); this module only generates, hashes and resolves them
//!
//! No HTTP framework dependencies here; the axum middleware lives in the
//! service crate.

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// Scheme prefix expected in the `Authorization` header
pub const TOKEN_SCHEME: &str = "Token";

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    /// Header present but not of the form `Token <key>`
    MalformedHeader(String),

    /// Token does not resolve to any user
    UnknownToken,

    /// Database error resolving the token
    DatabaseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MalformedHeader(reason) => {
                write!(f, "Malformed Authorization header: {}", reason)
            }
            ApiAuthError::UnknownToken => write!(f, "Invalid token"),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

/// Generate a new random API key (40 lowercase hex characters)
pub fn generate_token() -> String {
    let bytes: [u8; 20] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 hex digest of a key, as stored in `auth_tokens`
///
/// # Examples
///
/// ```
/// use foodgram_common::api::auth::hash_token;
///
/// let hash = hash_token("secret");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_token("secret"));
/// ```
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract the key from an `Authorization` header value
///
/// The scheme is matched case-insensitively; surrounding whitespace is ignored.
pub fn parse_authorization(header: &str) -> Result<&str, ApiAuthError> {
    let mut parts = header.trim().splitn(2, char::is_whitespace);
    let scheme = parts.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case(TOKEN_SCHEME) {
        return Err(ApiAuthError::MalformedHeader(format!(
            "expected '{} <key>'",
            TOKEN_SCHEME
        )));
    }

    let key = parts.next().map(str::trim).unwrap_or_default();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(ApiAuthError::MalformedHeader("missing key".to_string()));
    }

    Ok(key)
}

/// Store a key for a user
pub async fn issue_token(db: &SqlitePool, user_id: i64, token: &str) -> Result<(), ApiAuthError> {
    sqlx::query("INSERT INTO auth_tokens (token_hash, user_id) VALUES (?, ?)")
        .bind(hash_token(token))
        .bind(user_id)
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Resolve a key to the owning user id
pub async fn resolve_token(db: &SqlitePool, token: &str) -> Result<i64, ApiAuthError> {
    let user_id: Option<i64> =
        sqlx::query_scalar("SELECT user_id FROM auth_tokens WHERE token_hash = ?")
            .bind(hash_token(token))
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    user_id.ok_or(ApiAuthError::UnknownToken)
}
