use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/students", get(handlers::students::list_students))
        .route("/api/students", post(handlers::students::create_student))
        .route("/api/students/:id", put(handlers::students::update_student))
        .route("/api/students/:id", delete(handlers::students::delete_student))
        .route("/api/calendar", get(handlers::calendar::get_calendar))
        .route(
            "/api/lessons/:id/availability",
            get(handlers::calendar::get_availability),
        )
        .route(
            "/api/lessons/:id/reserve",
            post(handlers::reservations::reserve),
        )
        .route(
            "/api/reservations/:id",
            delete(handlers::reservations::cancel),
        )
}
