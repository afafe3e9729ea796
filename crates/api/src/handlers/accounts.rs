use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use eyre::WrapErr;
use lessonbook_core::{
    errors::BookingError,
    models::{
        account::{Account, LoginRequest, SessionResponse, SignupRequest},
        family::MAX_PHONE_NUMBER_LEN,
    },
};
use lessonbook_db::repositories::{account, family};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    middleware::{auth, error_handling::AppError},
    ApiState,
};

const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

fn validate_signup(payload: &SignupRequest) -> Result<(), BookingError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(BookingError::Validation(format!(
            "Username must be between 1 and {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BookingError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if payload.phone_number.trim().chars().count() > MAX_PHONE_NUMBER_LEN {
        return Err(BookingError::Validation(format!(
            "Phone number must be at most {} characters",
            MAX_PHONE_NUMBER_LEN
        )));
    }
    Ok(())
}

async fn open_session(state: &ApiState, account: Account) -> Result<SessionResponse, AppError> {
    let token = auth::generate_session_token();
    let expires_at = Utc::now() + state.session_ttl;
    account::create_session(&state.db_pool, account.id, &token, expires_at).await?;

    Ok(SessionResponse {
        token,
        account_id: account.id,
        username: account.username,
        is_admin: account.is_admin,
        expires_at,
        landing: SessionResponse::landing_for(account.is_admin).to_string(),
    })
}

/// Creates a guardian account together with its family.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    validate_signup(&payload)?;
    let username = payload.username.trim();
    let password_hash = auth::hash_password(&payload.password)?;

    let mut tx = state
        .db_pool
        .begin()
        .await
        .wrap_err("Failed to begin signup transaction")?;
    let db_account = account::create_account(&mut *tx, username, &password_hash, false)
        .await?
        .ok_or_else(|| BookingError::Conflict(format!("Username {} is already taken", username)))?;
    family::create_family(&mut *tx, db_account.id, payload.phone_number.trim()).await?;
    tx.commit().await.wrap_err("Failed to commit signup")?;

    info!("Guardian account created: {}", db_account.id);
    let session = open_session(&state, db_account.into()).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let invalid = || BookingError::Authentication("Invalid username or password".to_string());

    let db_account = account::get_account_by_username(&state.db_pool, payload.username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !auth::verify_password(&payload.password, &db_account.password_hash)? {
        return Err(invalid().into());
    }

    let purged = account::delete_expired_sessions(&state.db_pool, Utc::now()).await?;
    if purged > 0 {
        debug!("Purged {} expired sessions", purged);
    }

    info!("Account signed in: {}", db_account.id);
    let session = open_session(&state, db_account.into()).await?;
    Ok(Json(session))
}

/// Ends the session named by the bearer token. Unknown tokens are ignored.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = auth::bearer_token(&headers)?;

    account::delete_session(&state.db_pool, token).await?;
    Ok(StatusCode::NO_CONTENT)
}
