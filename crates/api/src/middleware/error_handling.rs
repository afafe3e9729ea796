//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and JSON error bodies, and maps
//! admission and cancellation outcomes to their response codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lessonbook_core::{
    admission::{AdmissionOutcome, CancellationOutcome, Rejection},
    errors::BookingError,
};
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// Handlers return `Result<T, AppError>` and use `?` on both
/// `BookingResult` and `eyre::Result` values.
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::Authentication(_) => StatusCode::UNAUTHORIZED,
            BookingError::Authorization(_) => StatusCode::FORBIDDEN,
            BookingError::Conflict(_) => StatusCode::CONFLICT,
            BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        }

        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

/// Repository failures surface as database errors.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Database(err))
    }
}

pub fn map_error(err: BookingError) -> Response {
    AppError(err).into_response()
}

pub fn rejection_status(reason: Rejection) -> StatusCode {
    match reason {
        Rejection::NotOwner => StatusCode::FORBIDDEN,
        _ => StatusCode::CONFLICT,
    }
}

fn rejection_body(reason: Rejection) -> Json<serde_json::Value> {
    Json(json!({
        "status": "rejected",
        "reason": reason,
        "message": reason.message(),
    }))
}

/// Confirmed is 201, waitlisted is 202, rejections are 409 or 403.
#[derive(Debug)]
pub struct AdmissionReply(pub AdmissionOutcome);

impl IntoResponse for AdmissionReply {
    fn into_response(self) -> Response {
        match self.0 {
            AdmissionOutcome::Rejected { reason } => {
                (rejection_status(reason), rejection_body(reason)).into_response()
            }
            outcome @ AdmissionOutcome::Confirmed { .. } => {
                (StatusCode::CREATED, Json(outcome)).into_response()
            }
            outcome @ AdmissionOutcome::Waitlisted { .. } => {
                (StatusCode::ACCEPTED, Json(outcome)).into_response()
            }
        }
    }
}

#[derive(Debug)]
pub struct CancellationReply(pub CancellationOutcome);

impl IntoResponse for CancellationReply {
    fn into_response(self) -> Response {
        match self.0 {
            CancellationOutcome::Rejected { reason } => {
                (rejection_status(reason), rejection_body(reason)).into_response()
            }
            outcome @ CancellationOutcome::Cancelled { .. } => {
                (StatusCode::OK, Json(outcome)).into_response()
            }
        }
    }
}
