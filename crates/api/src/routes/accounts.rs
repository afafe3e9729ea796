use axum::{routing::post, Router};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/accounts/signup", post(handlers::accounts::signup))
        .route("/api/accounts/login", post(handlers::accounts::login))
        .route("/api/accounts/logout", post(handlers::accounts::logout))
}
