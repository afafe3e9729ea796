//! # Authentication Module
//!
//! Password hashing, session tokens and the extractors that resolve a bearer
//! token into the signed-in account.
//!
//! Passwords are stored as Argon2 PHC strings. Session tokens are 32 random
//! bytes from the OS generator, hex encoded, and live in the `sessions`
//! table until they expire.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::Utc;
use eyre::Result;
use lessonbook_core::{
    admission::Caller,
    errors::BookingError,
    models::{account::Account, family::Family},
};
use lessonbook_db::repositories::{account, family};
use rand::RngCore;
use tracing::debug;

use crate::{middleware::error_handling::AppError, ApiState};

/// Hashes a password using the Argon2 algorithm with a fresh random salt.
///
/// Returns the hash in PHC string format (algorithm, parameters, salt and hash).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| eyre::eyre!("Error hashing password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Checks `password` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; a hash that cannot be parsed is an error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| eyre::eyre!("Stored password hash is invalid: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .ok_or_else(|| {
            AppError(BookingError::Authentication(
                "Missing or malformed bearer token".to_string(),
            ))
        })
}

/// Any signed-in account.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for CurrentAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let account = account::get_account_by_session(&state.db_pool, token, Utc::now())
            .await?
            .ok_or_else(|| {
                BookingError::Authentication("Session is invalid or has expired".to_string())
            })?;

        debug!("Authenticated account {}", account.id);
        Ok(CurrentAccount(account.into()))
    }
}

/// A signed-in account that owns a family.
#[derive(Debug, Clone)]
pub struct Guardian {
    pub account: Account,
    pub family: Family,
}

impl Guardian {
    pub fn caller(&self) -> Caller {
        Caller::Guardian {
            family_id: self.family.id,
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for Guardian {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentAccount(account) = CurrentAccount::from_request_parts(parts, state).await?;

        let family = family::get_family_by_account(&state.db_pool, account.id)
            .await?
            .ok_or_else(|| {
                BookingError::Authorization("A guardian account is required".to_string())
            })?;

        Ok(Guardian {
            account,
            family: family.into(),
        })
    }
}

/// A signed-in administrator.
#[derive(Debug, Clone)]
pub struct Admin(pub Account);

impl Admin {
    pub fn caller(&self) -> Caller {
        Caller::Administrator
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentAccount(account) = CurrentAccount::from_request_parts(parts, state).await?;

        if !account.is_admin {
            return Err(AppError(BookingError::Authorization(
                "Administrator access is required".to_string(),
            )));
        }

        Ok(Admin(account))
    }
}
