use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/admin/dashboard", get(handlers::admin::dashboard))
        // Lesson slots
        .route("/api/admin/lessons", get(handlers::lessons::list_lessons))
        .route("/api/admin/lessons", post(handlers::lessons::create_lesson))
        .route(
            "/api/admin/lessons/bulk",
            post(handlers::lessons::bulk_create_lessons),
        )
        .route("/api/admin/lessons/:id", get(handlers::lessons::get_lesson))
        .route("/api/admin/lessons/:id", put(handlers::lessons::update_lesson))
        .route(
            "/api/admin/lessons/:id",
            delete(handlers::lessons::delete_lesson),
        )
        .route(
            "/api/admin/lessons/:id/waitlist",
            get(handlers::lessons::list_waitlist),
        )
        .route(
            "/api/admin/lessons/:id/reservations",
            post(handlers::lessons::admit_student),
        )
        // Reservations
        .route(
            "/api/admin/reservations",
            get(handlers::admin::list_reservations),
        )
        .route(
            "/api/admin/reservations/:id",
            delete(handlers::admin::cancel_any_reservation),
        )
        // Families and students
        .route("/api/admin/families", get(handlers::admin::list_families))
        .route(
            "/api/admin/families/:id/students",
            post(handlers::admin::add_family_student),
        )
        .route(
            "/api/admin/students/:id",
            put(handlers::admin::update_any_student),
        )
        .route(
            "/api/admin/students/:id",
            delete(handlers::admin::delete_any_student),
        )
}
