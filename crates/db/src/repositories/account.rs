use crate::models::{DbAccount, DbSession};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

// Account Repository

/// Returns `None` when the username is already taken.
pub async fn create_account<'e, E>(
    executor: E,
    username: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<Option<DbAccount>>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let account = sqlx::query_as::<_, DbAccount>(
        r#"
        INSERT INTO accounts (id, username, password_hash, is_admin, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO NOTHING
        RETURNING id, username, password_hash, is_admin, created_at
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(password_hash)
    .bind(is_admin)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    if account.is_some() {
        tracing::debug!("Account created: id={}, is_admin={}", id, is_admin);
    }
    Ok(account)
}

pub async fn get_account_by_username(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Option<DbAccount>> {
    let account = sqlx::query_as::<_, DbAccount>(
        r#"
        SELECT id, username, password_hash, is_admin, created_at
        FROM accounts
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

// Session Repository

pub async fn create_session(
    pool: &Pool<Postgres>,
    account_id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<DbSession> {
    let session = sqlx::query_as::<_, DbSession>(
        r#"
        INSERT INTO sessions (token, account_id, created_at, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING token, account_id, created_at, expires_at
        "#,
    )
    .bind(token)
    .bind(account_id)
    .bind(Utc::now())
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Resolves a bearer token to its account, ignoring expired sessions.
pub async fn get_account_by_session(
    pool: &Pool<Postgres>,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<DbAccount>> {
    let account = sqlx::query_as::<_, DbAccount>(
        r#"
        SELECT a.id, a.username, a.password_hash, a.is_admin, a.created_at
        FROM sessions s
        JOIN accounts a ON a.id = s.account_id
        WHERE s.token = $1 AND s.expires_at > $2
        "#,
    )
    .bind(token)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Removes every session that expired at or before `now`.
pub async fn delete_expired_sessions(pool: &Pool<Postgres>, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE expires_at <= $1
        "#,
    )
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_session(pool: &Pool<Postgres>, token: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE token = $1
        "#,
    )
    .bind(token)
    .execute(pool)
    .await?;

    Ok(())
}
