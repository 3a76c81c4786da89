//! API route modules
//!
//! # Structure
//!
//! - [`health`] - liveness probe
//! - [`orders`] - checkout, order lifecycle
//! - [`products`] - catalog and stock
//! - [`customers`] - profiles and customer codes
//! - [`analytics`] - sales summary

pub mod analytics;
pub mod customers;
pub mod health;
pub mod orders;
pub mod products;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;
use crate::orders::MAX_SLIP_BYTES;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All routes, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(orders::router())
        .merge(products::router())
        .merge(customers::router())
        .merge(analytics::router())
        .merge(health::router())
}

/// Fully configured application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    let uploads_dir = ServerState::uploads_dir(&state.config);

    build_router()
        // Uploaded slips, served statically
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        // Slip uploads need headroom over the 10 MB file cap
        .layer(DefaultBodyLimit::max(MAX_SLIP_BYTES + 2 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .with_state(state)
}
