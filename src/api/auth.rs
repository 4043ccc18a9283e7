use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::Argon2;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::AppError;
use super::AppState;
use crate::database::models::UserId;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(e.to_string().into()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: UserId,
    exp: i64,
    token_type: TokenType,
}

pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and checks the access/refresh token pair. A refresh token can only
/// be exchanged for a new access token, never used as one.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime: chrono::Duration,
    refresh_lifetime: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime: chrono::Duration::minutes(access_minutes),
            refresh_lifetime: chrono::Duration::days(refresh_days),
        }
    }

    pub fn issue_access(&self, user: UserId) -> Result<String, AppError> {
        self.issue(user, TokenType::Access)
    }

    pub fn issue_pair(&self, user: UserId) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access: self.issue(user, TokenType::Access)?,
            refresh: self.issue(user, TokenType::Refresh)?,
        })
    }

    fn issue(&self, user: UserId, token_type: TokenType) -> Result<String, AppError> {
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };
        let claims = Claims {
            sub: user,
            exp: (chrono::Utc::now() + lifetime).timestamp(),
            token_type,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(e.to_string().into()))
    }

    pub fn verify(&self, token: &str, expected: TokenType) -> Result<UserId, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::Unauthenticated)?;
        if data.claims.token_type != expected {
            return Err(AppError::Unauthenticated);
        }
        Ok(data.claims.sub)
    }
}

/// The authenticated principal. Rejects the request when the bearer token is
/// absent or bad.
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(Self(state.tokens.verify(token, TokenType::Access)?)),
            None => Err(AppError::Unauthenticated),
        }
    }
}

/// Like [`AuthUser`] but an absent token means anonymous. A token that is
/// present but invalid is still rejected.
pub struct MaybeAuthUser(pub Option<UserId>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(Self(Some(state.tokens.verify(token, TokenType::Access)?))),
            None => Ok(Self(None)),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
fn test_issuer() -> TokenIssuer {
    TokenIssuer::new("test-secret", 60, 7)
}

#[test]
fn password_hashing_round_trip() {
    let hash = hash_password("hunter2hunter2").unwrap();
    assert_ne!(hash, "hunter2hunter2");
    assert!(verify_password("hunter2hunter2", &hash));
    assert!(!verify_password("wrong password", &hash));
    assert!(!verify_password("hunter2hunter2", "not a phc string"));
}

#[test]
fn hashes_are_salted() {
    let first = hash_password("same password").unwrap();
    let second = hash_password("same password").unwrap();
    assert_ne!(first, second);
}

#[test]
fn tokens_verify_by_type() {
    let issuer = test_issuer();
    let user = UserId(7);

    let pair = issuer.issue_pair(user).unwrap();
    assert_eq!(issuer.verify(&pair.access, TokenType::Access).unwrap(), user);
    assert_eq!(
        issuer.verify(&pair.refresh, TokenType::Refresh).unwrap(),
        user
    );

    assert!(issuer.verify(&pair.refresh, TokenType::Access).is_err());
    assert!(issuer.verify(&pair.access, TokenType::Refresh).is_err());
    assert!(issuer.verify("garbage", TokenType::Access).is_err());
}

#[test]
fn expired_tokens_are_rejected() {
    let user = UserId(7);

    // Lifetimes far enough in the past to clear the default decode leeway.
    let stale = TokenIssuer::new("test-secret", -5, -1);
    let pair = stale.issue_pair(user).unwrap();
    assert!(stale.verify(&pair.access, TokenType::Access).is_err());

    let fresh = test_issuer();
    assert!(fresh.verify(&pair.access, TokenType::Access).is_err());
}

#[test]
fn tokens_from_another_secret_are_rejected() {
    let user = UserId(7);
    let other = TokenIssuer::new("other-secret", 60, 7);
    let pair = other.issue_pair(user).unwrap();
    assert!(test_issuer().verify(&pair.access, TokenType::Access).is_err());
}
