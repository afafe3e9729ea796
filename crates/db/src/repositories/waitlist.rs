use crate::models::{DbBookingDetail, DbWaitlistEntry};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

/// Returns `None` when the (slot, student) pair is already waitlisted.
pub async fn insert_waitlist_entry<'e, E>(
    executor: E,
    lesson_slot_id: Uuid,
    student_id: Uuid,
    waitlisted_at: DateTime<Utc>,
) -> Result<Option<DbWaitlistEntry>>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();

    let entry = sqlx::query_as::<_, DbWaitlistEntry>(
        r#"
        INSERT INTO waitlist_entries (id, lesson_slot_id, student_id, waitlisted_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT ON CONSTRAINT waitlist_slot_student DO NOTHING
        RETURNING id, lesson_slot_id, student_id, waitlisted_at
        "#,
    )
    .bind(id)
    .bind(lesson_slot_id)
    .bind(student_id)
    .bind(waitlisted_at)
    .fetch_optional(executor)
    .await?;

    Ok(entry)
}

/// The slot's waitlist, first in line first.
pub async fn list_waitlist_for_slot(
    pool: &Pool<Postgres>,
    lesson_slot_id: Uuid,
) -> Result<Vec<DbBookingDetail>> {
    let entries = sqlx::query_as::<_, DbBookingDetail>(
        r#"
        SELECT w.id, w.lesson_slot_id, l.title AS lesson_title, l.start_time AS lesson_start_time,
               w.student_id, s.name AS student_name, s.family_id, w.waitlisted_at AS registered_at
        FROM waitlist_entries w
        JOIN lesson_slots l ON l.id = w.lesson_slot_id
        JOIN students s ON s.id = w.student_id
        WHERE w.lesson_slot_id = $1
        ORDER BY w.waitlisted_at ASC, w.id ASC
        "#,
    )
    .bind(lesson_slot_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// A family's waitlist entries for lessons starting at or after `now`.
pub async fn list_upcoming_waitlist_by_family(
    pool: &Pool<Postgres>,
    family_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<DbWaitlistEntry>> {
    let entries = sqlx::query_as::<_, DbWaitlistEntry>(
        r#"
        SELECT w.id, w.lesson_slot_id, w.student_id, w.waitlisted_at
        FROM waitlist_entries w
        JOIN students s ON s.id = w.student_id
        JOIN lesson_slots l ON l.id = w.lesson_slot_id
        WHERE s.family_id = $1 AND l.start_time >= $2
        ORDER BY w.waitlisted_at ASC
        "#,
    )
    .bind(family_id)
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
