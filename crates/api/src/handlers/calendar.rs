use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use lessonbook_core::{
    availability::summarize,
    errors::BookingError,
    calendar::{group_by_day, CalendarLesson, CalendarResponse},
    models::{
        lesson_slot::AvailabilityResponse,
        reservation::{Reservation, WaitlistEntry},
    },
};
use lessonbook_db::repositories::{lesson_slot, reservation, student, waitlist};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{
        auth::{CurrentAccount, Guardian},
        error_handling::AppError,
    },
    ApiState,
};

/// Upcoming lessons grouped by local date, with the family's own bookings.
#[axum::debug_handler]
pub async fn get_calendar(
    State(state): State<Arc<ApiState>>,
    guardian: Guardian,
) -> Result<Json<CalendarResponse>, AppError> {
    let now = Utc::now();
    let family_id = guardian.family.id;

    let slots = lesson_slot::list_upcoming_lesson_slots(&state.db_pool, now).await?;
    let reservations: Vec<Reservation> =
        reservation::list_upcoming_reservations_by_family(&state.db_pool, family_id, now)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
    let waitlist: Vec<WaitlistEntry> =
        waitlist::list_upcoming_waitlist_by_family(&state.db_pool, family_id, now)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
    let students = student::list_students_by_family(&state.db_pool, family_id).await?;

    let lessons = slots
        .into_iter()
        .map(|row| {
            let summary = summarize(row.slot.into(), row.reserved_count, now);
            let slot_id = summary.slot.id;
            CalendarLesson {
                my_reservations: reservations
                    .iter()
                    .filter(|r| r.lesson_slot_id == slot_id)
                    .cloned()
                    .collect(),
                my_waitlist: waitlist
                    .iter()
                    .filter(|w| w.lesson_slot_id == slot_id)
                    .cloned()
                    .collect(),
                summary,
            }
        })
        .collect();

    Ok(Json(CalendarResponse {
        students: students.into_iter().map(Into::into).collect(),
        days: group_by_day(lessons, state.timezone),
    }))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    _account: CurrentAccount,
    Path(id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let row = lesson_slot::get_lesson_slot_with_count(&state.db_pool, id)
        .await?
        .ok_or_else(|| BookingError::not_found("Lesson slot", id))?;
    let summary = summarize(row.slot.into(), row.reserved_count, Utc::now());

    Ok(Json(AvailabilityResponse::from(&summary)))
}
