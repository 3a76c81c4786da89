//! Customer API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/customers", customer_routes())
}

fn customer_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{uid}", get(handler::get_by_uid))
        .route("/assign-code", post(handler::assign_code))
        .route("/profile", post(handler::upsert_profile))
        .route("/set-active", post(handler::set_active))
}
