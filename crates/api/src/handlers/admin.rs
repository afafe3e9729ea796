use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use lessonbook_core::{
    admission::cancel_reservation,
    errors::BookingError,
    models::{
        family::FamilyWithStudents,
        reservation::BookingDetail,
        student::{Student, StudentRequest},
    },
};
use lessonbook_db::repositories::{family, lesson_slot, reservation, student};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::info;
use uuid::Uuid;

use crate::{
    middleware::{
        auth::Admin,
        error_handling::{AppError, CancellationReply},
    },
    ApiState,
};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_lessons: i64,
    pub upcoming_lessons: i64,
    pub total_reservations: i64,
    pub total_students: i64,
    pub total_families: i64,
}

#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
) -> Result<Json<DashboardResponse>, AppError> {
    let pool = &state.db_pool;

    Ok(Json(DashboardResponse {
        total_lessons: lesson_slot::count_lesson_slots(pool).await?,
        upcoming_lessons: lesson_slot::count_upcoming_lesson_slots(pool, Utc::now()).await?,
        total_reservations: reservation::count_all_reservations(pool).await?,
        total_students: student::count_students(pool).await?,
        total_families: family::count_families(pool).await?,
    }))
}

/// Every reservation, most recent first.
#[axum::debug_handler]
pub async fn list_reservations(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
) -> Result<Json<Vec<BookingDetail>>, AppError> {
    let rows = reservation::list_reservations(&state.db_pool).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[axum::debug_handler]
pub async fn cancel_any_reservation(
    State(state): State<Arc<ApiState>>,
    admin: Admin,
    Path(id): Path<Uuid>,
) -> Result<CancellationReply, AppError> {
    let outcome = cancel_reservation(&state.store, id, &admin.caller()).await?;
    Ok(CancellationReply(outcome))
}

#[axum::debug_handler]
pub async fn list_families(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
) -> Result<Json<Vec<FamilyWithStudents>>, AppError> {
    let families = family::list_families(&state.db_pool).await?;

    let mut by_family: HashMap<Uuid, Vec<Student>> = HashMap::new();
    for row in student::list_all_students(&state.db_pool).await? {
        let student = Student::from(row);
        by_family.entry(student.family_id).or_default().push(student);
    }

    Ok(Json(
        families
            .into_iter()
            .map(|row| FamilyWithStudents {
                students: by_family.remove(&row.id).unwrap_or_default(),
                id: row.id,
                username: row.username,
                phone_number: row.phone_number,
            })
            .collect(),
    ))
}

#[axum::debug_handler]
pub async fn add_family_student(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
    Path(family_id): Path<Uuid>,
    Json(payload): Json<StudentRequest>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let name = payload.validated_name()?;
    family::get_family_by_id(&state.db_pool, family_id)
        .await?
        .ok_or_else(|| BookingError::not_found("Family", family_id))?;

    let created = student::create_student(&state.db_pool, family_id, name).await?;
    info!("Administrator added student {} to family {}", created.id, family_id);
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[axum::debug_handler]
pub async fn update_any_student(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
    Path(id): Path<Uuid>,
    Json(payload): Json<StudentRequest>,
) -> Result<Json<Student>, AppError> {
    let name = payload.validated_name()?;
    let updated = student::update_student_name(&state.db_pool, id, name)
        .await?
        .ok_or_else(|| BookingError::not_found("Student", id))?;
    Ok(Json(updated.into()))
}

#[axum::debug_handler]
pub async fn delete_any_student(
    State(state): State<Arc<ApiState>>,
    _admin: Admin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !student::delete_student(&state.db_pool, id).await? {
        return Err(BookingError::not_found("Student", id).into());
    }

    info!("Administrator deleted student {}", id);
    Ok(StatusCode::NO_CONTENT)
}
