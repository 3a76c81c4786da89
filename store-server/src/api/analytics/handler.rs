//! Analytics API handlers

use axum::{Json, extract::State};

use crate::auth::Owner;
use crate::core::ServerState;
use crate::db::models::AnalyticsSummary;
use crate::db::repository::AnalyticsRepository;
use crate::utils::AppResult;

/// GET /api/analytics/summary - owner dashboard numbers
pub async fn summary(
    State(state): State<ServerState>,
    _owner: Owner,
) -> AppResult<Json<AnalyticsSummary>> {
    let summary = AnalyticsRepository::new(state.db.clone()).summary().await?;
    Ok(Json(summary))
}
