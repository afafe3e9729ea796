use crate::models::{DbBookingDetail, DbReservation, DbReservationOwner};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

pub async fn count_reservations<'e, E>(executor: E, lesson_slot_id: Uuid) -> Result<i64>
where
    E: PgExecutor<'e>,
{
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM reservations
        WHERE lesson_slot_id = $1
        "#,
    )
    .bind(lesson_slot_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Returns `None` when the (slot, student) pair is already reserved.
pub async fn insert_reservation<'e, E>(
    executor: E,
    lesson_slot_id: Uuid,
    student_id: Uuid,
    reserved_at: DateTime<Utc>,
) -> Result<Option<DbReservation>>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();

    let reservation = sqlx::query_as::<_, DbReservation>(
        r#"
        INSERT INTO reservations (id, lesson_slot_id, student_id, reserved_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT ON CONSTRAINT reservations_slot_student DO NOTHING
        RETURNING id, lesson_slot_id, student_id, reserved_at
        "#,
    )
    .bind(id)
    .bind(lesson_slot_id)
    .bind(student_id)
    .bind(reserved_at)
    .fetch_optional(executor)
    .await?;

    Ok(reservation)
}

pub async fn get_reservation_owner(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbReservationOwner>> {
    let owner = sqlx::query_as::<_, DbReservationOwner>(
        r#"
        SELECT r.id, r.lesson_slot_id, r.student_id, r.reserved_at, s.family_id
        FROM reservations r
        JOIN students s ON s.id = r.student_id
        WHERE r.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(owner)
}

pub async fn delete_reservation(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM reservations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Every reservation, most recent first.
pub async fn list_reservations(pool: &Pool<Postgres>) -> Result<Vec<DbBookingDetail>> {
    let reservations = sqlx::query_as::<_, DbBookingDetail>(
        r#"
        SELECT r.id, r.lesson_slot_id, l.title AS lesson_title, l.start_time AS lesson_start_time,
               r.student_id, s.name AS student_name, s.family_id, r.reserved_at AS registered_at
        FROM reservations r
        JOIN lesson_slots l ON l.id = r.lesson_slot_id
        JOIN students s ON s.id = r.student_id
        ORDER BY r.reserved_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(reservations)
}

/// A family's reservations for lessons starting at or after `now`.
pub async fn list_upcoming_reservations_by_family(
    pool: &Pool<Postgres>,
    family_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<DbReservation>> {
    let reservations = sqlx::query_as::<_, DbReservation>(
        r#"
        SELECT r.id, r.lesson_slot_id, r.student_id, r.reserved_at
        FROM reservations r
        JOIN students s ON s.id = r.student_id
        JOIN lesson_slots l ON l.id = r.lesson_slot_id
        WHERE s.family_id = $1 AND l.start_time >= $2
        ORDER BY r.reserved_at ASC
        "#,
    )
    .bind(family_id)
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(reservations)
}

pub async fn count_all_reservations(pool: &Pool<Postgres>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
