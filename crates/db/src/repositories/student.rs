use crate::models::DbStudent;
use chrono::Utc;
use eyre::Result;
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

pub async fn create_student(
    pool: &Pool<Postgres>,
    family_id: Uuid,
    name: &str,
) -> Result<DbStudent> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let student = sqlx::query_as::<_, DbStudent>(
        r#"
        INSERT INTO students (id, family_id, name, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, family_id, name, created_at
        "#,
    )
    .bind(id)
    .bind(family_id)
    .bind(name)
    .bind(now)
    .fetch_one(pool)
    .await?;

    tracing::debug!("Student created: id={}, family={}", id, family_id);
    Ok(student)
}

pub async fn get_student_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<DbStudent>>
where
    E: PgExecutor<'e>,
{
    let student = sqlx::query_as::<_, DbStudent>(
        r#"
        SELECT id, family_id, name, created_at
        FROM students
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(student)
}

pub async fn list_students_by_family(
    pool: &Pool<Postgres>,
    family_id: Uuid,
) -> Result<Vec<DbStudent>> {
    let students = sqlx::query_as::<_, DbStudent>(
        r#"
        SELECT id, family_id, name, created_at
        FROM students
        WHERE family_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(family_id)
    .fetch_all(pool)
    .await?;

    Ok(students)
}

pub async fn list_all_students(pool: &Pool<Postgres>) -> Result<Vec<DbStudent>> {
    let students = sqlx::query_as::<_, DbStudent>(
        r#"
        SELECT id, family_id, name, created_at
        FROM students
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(students)
}

pub async fn update_student_name(
    pool: &Pool<Postgres>,
    id: Uuid,
    name: &str,
) -> Result<Option<DbStudent>> {
    let student = sqlx::query_as::<_, DbStudent>(
        r#"
        UPDATE students
        SET name = $2
        WHERE id = $1
        RETURNING id, family_id, name, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(student)
}

/// Deletes the student together with its reservations and waitlist entries.
pub async fn delete_student(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM students
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_students(pool: &Pool<Postgres>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
