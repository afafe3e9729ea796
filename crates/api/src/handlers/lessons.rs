use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use lessonbook_core::{
    admission::request_admission,
    availability::summarize,
    errors::BookingError,
    generator::generate_slots,
    models::{
        lesson_slot::{
            BulkSlotRequest, BulkSlotResponse, LessonSlot, LessonSlotRequest, LessonSlotSummary,
        },
        reservation::{BookingDetail, ReserveRequest},
    },
};
use lessonbook_db::repositories::{lesson_slot, waitlist};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    middleware::{
        auth::Admin,
        error_handling::{AdmissionReply, AppError},
    },
    ApiState,
};

/// Every lesson slot, latest start first.
#[axum::debug_handler]
pub async fn list_lessons(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
) -> Result<Json<Vec<LessonSlotSummary>>, AppError> {
    let now = Utc::now();
    let rows = lesson_slot::list_lesson_slots(&state.db_pool).await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| summarize(row.slot.into(), row.reserved_count, now))
            .collect(),
    ))
}

#[axum::debug_handler]
pub async fn create_lesson(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
    Json(payload): Json<LessonSlotRequest>,
) -> Result<(StatusCode, Json<LessonSlot>), AppError> {
    let new_slot = payload.validate()?;
    let created = lesson_slot::create_lesson_slot(&state.db_pool, &new_slot).await?;

    info!("Lesson slot created: {}", created.id);
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[axum::debug_handler]
pub async fn get_lesson(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
    Path(id): Path<Uuid>,
) -> Result<Json<LessonSlotSummary>, AppError> {
    let row = lesson_slot::get_lesson_slot_with_count(&state.db_pool, id)
        .await?
        .ok_or_else(|| BookingError::not_found("Lesson slot", id))?;

    Ok(Json(summarize(row.slot.into(), row.reserved_count, Utc::now())))
}

#[axum::debug_handler]
pub async fn update_lesson(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
    Path(id): Path<Uuid>,
    Json(payload): Json<LessonSlotRequest>,
) -> Result<Json<LessonSlot>, AppError> {
    let changes = payload.validate()?;
    let updated = lesson_slot::update_lesson_slot(&state.db_pool, id, &changes)
        .await?
        .ok_or_else(|| BookingError::not_found("Lesson slot", id))?;

    info!("Lesson slot updated: {}", id);
    Ok(Json(updated.into()))
}

/// Deletes the slot with all of its reservations and waitlist entries.
#[axum::debug_handler]
pub async fn delete_lesson(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !lesson_slot::delete_lesson_slot(&state.db_pool, id).await? {
        return Err(BookingError::not_found("Lesson slot", id).into());
    }

    info!("Lesson slot deleted: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn bulk_create_lessons(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
    Json(payload): Json<BulkSlotRequest>,
) -> Result<(StatusCode, Json<BulkSlotResponse>), AppError> {
    let created = generate_slots(&state.store, &payload, state.timezone).await?;
    Ok((StatusCode::CREATED, Json(BulkSlotResponse { created })))
}

/// The slot's waitlist in registration order.
#[axum::debug_handler]
pub async fn list_waitlist(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<BookingDetail>>, AppError> {
    lesson_slot::get_lesson_slot_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| BookingError::not_found("Lesson slot", id))?;

    let entries = waitlist::list_waitlist_for_slot(&state.db_pool, id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Admits any student regardless of the opening time. Full slots are
/// rejected instead of waitlisting.
#[axum::debug_handler]
pub async fn admit_student(
    State(state): State<Arc<ApiState>>,
    admin: Admin,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReserveRequest>,
) -> Result<AdmissionReply, AppError> {
    let outcome = request_admission(
        &state.store,
        id,
        payload.student_id,
        &admin.caller(),
        Utc::now(),
    )
    .await?;

    Ok(AdmissionReply(outcome))
}
