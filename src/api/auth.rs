use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::routes::AppState;
use crate::error::ApiError;

/// JWT claims: `sub` = user id, `jti` = session id (revoked on logout),
/// `exp` (expiry), `iat` (issued at).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated user extracted from a JWT Bearer token whose session is
/// still active.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

/// Stored credential per user (username is kept lowercase).
#[derive(Debug, Clone)]
pub struct UserCredential {
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// Username (lowercase) -> credential.
pub type UserStore = Arc<RwLock<HashMap<String, UserCredential>>>;

/// Session ids (`jti`) with a live login behind them.
pub type SessionStore = Arc<RwLock<HashSet<Uuid>>>;

const JWT_EXPIRY_HOURS: i64 = 24;

impl Claims {
    pub fn new(user_id: Uuid, session_id: Uuid) -> Self {
        let now = chrono::Utc::now();
        let exp = (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp();
        Self {
            sub: user_id.to_string(),
            jti: session_id.to_string(),
            exp,
            iat: now.timestamp(),
        }
    }
}

pub fn create_token(
    secret: &[u8],
    user_id: Uuid,
    session_id: Uuid,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(user_id, session_id);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

pub fn decode_token(secret: &[u8], token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
    Ok(token_data.claims)
}

/// Hash a password with a fresh random salt (argon2, PHC string form).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Burn a verification against a throwaway hash. Run on the unknown-username
/// login path so its timing matches a real mismatch.
pub fn verify_dummy(password: &str) {
    let hash =
        DUMMY_HASH.get_or_init(|| hash_password("placeholder-password").unwrap_or_default());
    let _ = verify_password(password, hash);
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let claims =
            decode_token(&state.jwt_secret, token).map_err(|_| ApiError::Unauthorized)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;
        let session_id = Uuid::parse_str(&claims.jti).map_err(|_| ApiError::Unauthorized)?;

        if !state.sessions.read().await.contains(&session_id) {
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser {
            user_id,
            session_id,
        })
    }
}
