//! API routes and handlers for the rule-storage service

#![allow(clippy::disallowed_methods)] // json! macro used in multiple functions

use crate::store::LogicStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use pulse_rules::Rule;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    pub store: LogicStore,
}

/// Create all API routes with state
pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/machines/{machine_id}/logic",
            get(get_machine_logic).post(update_machine_logic),
        )
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Retrieve the processing logic for a machine
async fn get_machine_logic(
    State(state): State<Arc<AppState>>,
    Path(machine_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.store.get(&machine_id) {
        Some(logic) => Ok(Json(json!({
            "machine_id": machine_id,
            "logic": logic,
        }))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Machine not found" })),
        )),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateLogicRequest {
    logic: String,
}

/// Register or replace the processing logic for a machine
///
/// The submitted text must pass the minimal rule shape check (parse as a
/// status expression); anything else is rejected with 400 so unusable rules
/// never reach the engine.
async fn update_machine_logic(
    State(state): State<Arc<AppState>>,
    Path(machine_id): Path<String>,
    Json(request): Json<UpdateLogicRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Err(e) = Rule::check_shape(&request.logic) {
        warn!(machine_id = %machine_id, "Rejected rule submission: {}", e);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": format!("Invalid rule format: {}", e) })),
        ));
    }

    state.store.put(&machine_id, &request.logic);
    info!(machine_id = %machine_id, "Rule updated");
    Ok(Json(json!({
        "message": "Logic updated successfully",
        "machine_id": machine_id,
    })))
}
