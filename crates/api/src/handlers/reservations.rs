use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use lessonbook_core::{
    admission::{cancel_reservation, request_admission},
    models::reservation::ReserveRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{
        auth::Guardian,
        error_handling::{AdmissionReply, AppError, CancellationReply},
    },
    ApiState,
};

/// Reserves a place for one of the guardian's students, or waitlists them
/// when the lesson is full.
#[axum::debug_handler]
pub async fn reserve(
    State(state): State<Arc<ApiState>>,
    guardian: Guardian,
    Path(slot_id): Path<Uuid>,
    Json(payload): Json<ReserveRequest>,
) -> Result<AdmissionReply, AppError> {
    let outcome = request_admission(
        &state.store,
        slot_id,
        payload.student_id,
        &guardian.caller(),
        Utc::now(),
    )
    .await?;

    Ok(AdmissionReply(outcome))
}

#[axum::debug_handler]
pub async fn cancel(
    State(state): State<Arc<ApiState>>,
    guardian: Guardian,
    Path(id): Path<Uuid>,
) -> Result<CancellationReply, AppError> {
    let outcome = cancel_reservation(&state.store, id, &guardian.caller()).await?;
    Ok(CancellationReply(outcome))
}
