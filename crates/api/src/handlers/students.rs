use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use lessonbook_core::{
    errors::BookingError,
    models::student::{Student, StudentRequest},
};
use lessonbook_db::repositories::student;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    middleware::{auth::Guardian, error_handling::AppError},
    ApiState,
};

/// Loads a student of the guardian's family. Students of other families look
/// exactly like missing ones.
async fn own_student(
    state: &ApiState,
    guardian: &Guardian,
    id: Uuid,
) -> Result<Student, AppError> {
    student::get_student_by_id(&state.db_pool, id)
        .await?
        .map(Student::from)
        .filter(|s| s.family_id == guardian.family.id)
        .ok_or_else(|| BookingError::not_found("Student", id).into())
}

#[axum::debug_handler]
pub async fn list_students(
    State(state): State<Arc<ApiState>>,
    guardian: Guardian,
) -> Result<Json<Vec<Student>>, AppError> {
    let students = student::list_students_by_family(&state.db_pool, guardian.family.id).await?;
    Ok(Json(students.into_iter().map(Into::into).collect()))
}

#[axum::debug_handler]
pub async fn create_student(
    State(state): State<Arc<ApiState>>,
    guardian: Guardian,
    Json(payload): Json<StudentRequest>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let name = payload.validated_name()?;
    let created = student::create_student(&state.db_pool, guardian.family.id, name).await?;

    info!("Student {} added to family {}", created.id, guardian.family.id);
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[axum::debug_handler]
pub async fn update_student(
    State(state): State<Arc<ApiState>>,
    guardian: Guardian,
    Path(id): Path<Uuid>,
    Json(payload): Json<StudentRequest>,
) -> Result<Json<Student>, AppError> {
    let name = payload.validated_name()?;
    own_student(&state, &guardian, id).await?;

    let updated = student::update_student_name(&state.db_pool, id, name)
        .await?
        .ok_or_else(|| BookingError::not_found("Student", id))?;
    Ok(Json(updated.into()))
}

/// Deleting a student also removes their reservations and waitlist entries.
#[axum::debug_handler]
pub async fn delete_student(
    State(state): State<Arc<ApiState>>,
    guardian: Guardian,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    own_student(&state, &guardian, id).await?;

    if !student::delete_student(&state.db_pool, id).await? {
        return Err(BookingError::not_found("Student", id).into());
    }

    info!("Student {} deleted by family {}", id, guardian.family.id);
    Ok(StatusCode::NO_CONTENT)
}
