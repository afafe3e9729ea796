use crate::models::{DbFamily, DbFamilyListing};
use chrono::Utc;
use eyre::Result;
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

pub async fn create_family<'e, E>(
    executor: E,
    account_id: Uuid,
    phone_number: &str,
) -> Result<DbFamily>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let family = sqlx::query_as::<_, DbFamily>(
        r#"
        INSERT INTO families (id, account_id, phone_number, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, account_id, phone_number, created_at
        "#,
    )
    .bind(id)
    .bind(account_id)
    .bind(phone_number)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(family)
}

pub async fn get_family_by_account(
    pool: &Pool<Postgres>,
    account_id: Uuid,
) -> Result<Option<DbFamily>> {
    let family = sqlx::query_as::<_, DbFamily>(
        r#"
        SELECT id, account_id, phone_number, created_at
        FROM families
        WHERE account_id = $1
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(family)
}

pub async fn get_family_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbFamily>> {
    let family = sqlx::query_as::<_, DbFamily>(
        r#"
        SELECT id, account_id, phone_number, created_at
        FROM families
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(family)
}

pub async fn list_families(pool: &Pool<Postgres>) -> Result<Vec<DbFamilyListing>> {
    let families = sqlx::query_as::<_, DbFamilyListing>(
        r#"
        SELECT f.id, a.username, f.phone_number
        FROM families f
        JOIN accounts a ON a.id = f.account_id
        ORDER BY a.username ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(families)
}

pub async fn count_families(pool: &Pool<Postgres>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM families")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
