use crate::models::{DbLessonSlot, DbLessonSlotWithCount};
use chrono::{DateTime, Utc};
use eyre::Result;
use lessonbook_core::models::lesson_slot::NewLessonSlot;
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

pub async fn create_lesson_slot<'e, E>(executor: E, slot: &NewLessonSlot) -> Result<DbLessonSlot>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let lesson_slot = sqlx::query_as::<_, DbLessonSlot>(
        r#"
        INSERT INTO lesson_slots (id, title, start_time, end_time, capacity, reservation_opens_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, title, start_time, end_time, capacity, reservation_opens_at, created_at
        "#,
    )
    .bind(id)
    .bind(&slot.title)
    .bind(slot.start_time)
    .bind(slot.end_time)
    .bind(slot.capacity)
    .bind(slot.reservation_opens_at)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(lesson_slot)
}

pub async fn get_lesson_slot_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<DbLessonSlot>>
where
    E: PgExecutor<'e>,
{
    let lesson_slot = sqlx::query_as::<_, DbLessonSlot>(
        r#"
        SELECT id, title, start_time, end_time, capacity, reservation_opens_at, created_at
        FROM lesson_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(lesson_slot)
}

/// Reads the slot and holds its row lock until the surrounding transaction ends.
pub async fn lock_lesson_slot<'e, E>(executor: E, id: Uuid) -> Result<Option<DbLessonSlot>>
where
    E: PgExecutor<'e>,
{
    let lesson_slot = sqlx::query_as::<_, DbLessonSlot>(
        r#"
        SELECT id, title, start_time, end_time, capacity, reservation_opens_at, created_at
        FROM lesson_slots
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(lesson_slot)
}

pub async fn get_lesson_slot_with_count(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbLessonSlotWithCount>> {
    let lesson_slot = sqlx::query_as::<_, DbLessonSlotWithCount>(
        r#"
        SELECT s.id, s.title, s.start_time, s.end_time, s.capacity, s.reservation_opens_at, s.created_at,
               (SELECT COUNT(*) FROM reservations r WHERE r.lesson_slot_id = s.id) AS reserved_count
        FROM lesson_slots s
        WHERE s.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(lesson_slot)
}

/// All slots, latest start first.
pub async fn list_lesson_slots(pool: &Pool<Postgres>) -> Result<Vec<DbLessonSlotWithCount>> {
    let lesson_slots = sqlx::query_as::<_, DbLessonSlotWithCount>(
        r#"
        SELECT s.id, s.title, s.start_time, s.end_time, s.capacity, s.reservation_opens_at, s.created_at,
               (SELECT COUNT(*) FROM reservations r WHERE r.lesson_slot_id = s.id) AS reserved_count
        FROM lesson_slots s
        ORDER BY s.start_time DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(lesson_slots)
}

/// Slots starting at or after `now`, earliest first.
pub async fn list_upcoming_lesson_slots(
    pool: &Pool<Postgres>,
    now: DateTime<Utc>,
) -> Result<Vec<DbLessonSlotWithCount>> {
    let lesson_slots = sqlx::query_as::<_, DbLessonSlotWithCount>(
        r#"
        SELECT s.id, s.title, s.start_time, s.end_time, s.capacity, s.reservation_opens_at, s.created_at,
               (SELECT COUNT(*) FROM reservations r WHERE r.lesson_slot_id = s.id) AS reserved_count
        FROM lesson_slots s
        WHERE s.start_time >= $1
        ORDER BY s.start_time ASC
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(lesson_slots)
}

pub async fn update_lesson_slot(
    pool: &Pool<Postgres>,
    id: Uuid,
    slot: &NewLessonSlot,
) -> Result<Option<DbLessonSlot>> {
    let lesson_slot = sqlx::query_as::<_, DbLessonSlot>(
        r#"
        UPDATE lesson_slots
        SET title = $2, start_time = $3, end_time = $4, capacity = $5, reservation_opens_at = $6
        WHERE id = $1
        RETURNING id, title, start_time, end_time, capacity, reservation_opens_at, created_at
        "#,
    )
    .bind(id)
    .bind(&slot.title)
    .bind(slot.start_time)
    .bind(slot.end_time)
    .bind(slot.capacity)
    .bind(slot.reservation_opens_at)
    .fetch_optional(pool)
    .await?;

    Ok(lesson_slot)
}

/// Deletes the slot together with its reservations and waitlist entries.
pub async fn delete_lesson_slot(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM lesson_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_lesson_slots(pool: &Pool<Postgres>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lesson_slots")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn count_upcoming_lesson_slots(
    pool: &Pool<Postgres>,
    now: DateTime<Utc>,
) -> Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lesson_slots WHERE start_time >= $1")
            .bind(now)
            .fetch_one(pool)
            .await?;

    Ok(count)
}
