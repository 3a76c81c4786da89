//! Customer API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::is_customer_code;

use crate::auth::{Caller, Owner};
use crate::core::ServerState;
use crate::db::models::{CustomerProfile, CustomerProfileUpsert};
use crate::db::repository::{CustomerRepository, CounterRepository, CUSTOMERS_COUNTER};
use crate::utils::{AppError, AppResult};

/// GET /api/customers - owner lists profiles
pub async fn list(
    State(state): State<ServerState>,
    _owner: Owner,
) -> AppResult<Json<Vec<CustomerProfile>>> {
    let profiles = CustomerRepository::new(state.db.clone()).find_all().await?;
    Ok(Json(profiles))
}

/// GET /api/customers/:uid - owner reads one profile
pub async fn get_by_uid(
    State(state): State<ServerState>,
    _owner: Owner,
    Path(uid): Path<String>,
) -> AppResult<Json<CustomerProfile>> {
    let profile = CustomerRepository::new(state.db.clone())
        .find_by_uid(&uid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Profile {uid}")))?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct AssignCodeRequest {
    pub uid: String,
}

/// POST /api/customers/assign-code - give a profile its permanent
/// customer code.
///
/// Idempotent: a profile that already holds a valid code keeps it,
/// whatever value the counter has moved to since. A legacy code that
/// is not a bare decimal string is replaced by a fresh one. Callers
/// may only assign their own code; the owner may assign anyone's.
pub async fn assign_code(
    State(state): State<ServerState>,
    Caller(caller): Caller,
    Json(body): Json<AssignCodeRequest>,
) -> AppResult<Json<Value>> {
    if body.uid != caller.uid && !caller.is_owner() {
        return Err(AppError::unauthorized());
    }

    let customers = CustomerRepository::new(state.db.clone());
    let profile = customers
        .find_by_uid(&body.uid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Profile {}", body.uid)))?;

    if let Some(code) = profile.customer_code.filter(|c| is_customer_code(c)) {
        return Ok(Json(json!({ "customerCode": code })));
    }

    // A lost race burns a counter value; codes stay unique either way
    let seq = CounterRepository::new(state.db.clone())
        .allocate(CUSTOMERS_COUNTER)
        .await?;
    let code = customers
        .set_customer_code_once(&body.uid, &seq.to_string())
        .await?;

    tracing::info!(uid = %body.uid, %code, "Customer code assigned");
    Ok(Json(json!({ "customerCode": code })))
}

/// POST /api/customers/profile - caller updates their own profile
pub async fn upsert_profile(
    State(state): State<ServerState>,
    Caller(caller): Caller,
    Json(data): Json<CustomerProfileUpsert>,
) -> AppResult<Json<CustomerProfile>> {
    let profile = CustomerRepository::new(state.db.clone())
        .upsert(&caller.uid, data)
        .await?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub uid: String,
    pub active: bool,
}

/// POST /api/customers/set-active - owner blocks or unblocks a
/// customer from placing new orders
pub async fn set_active(
    State(state): State<ServerState>,
    _owner: Owner,
    Json(body): Json<SetActiveRequest>,
) -> AppResult<Json<Value>> {
    CustomerRepository::new(state.db.clone())
        .set_active(&body.uid, body.active)
        .await?;
    Ok(Json(json!({ "ok": true })))
}
