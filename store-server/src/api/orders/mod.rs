//! Order API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/create", post(handler::create))
        .route("/next-code", get(handler::next_code))
        .route("/migrate-to-uid", post(handler::migrate_to_uid))
        .route("/update-status", post(handler::update_status))
        .route("/edit", post(handler::edit))
        .route("/delete", post(handler::delete))
}
