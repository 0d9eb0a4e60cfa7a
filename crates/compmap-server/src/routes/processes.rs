use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use compmap_core::bulk::BulkActionRequest;
use compmap_core::eligibility;
use compmap_core::store::ProcessStore;
use compmap_core::types::BulkAction;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/processes/:id/context — process, participants, capability
/// flags, bulk candidate pools, and the actions worth offering.
pub async fn get_context(
    State(app): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let context = app.store.fetch_context(id).await?;
    let pools = eligibility::candidate_pools(&context.participants);
    let offered = eligibility::offered_actions(&context.participants, &context.capabilities);

    Ok(Json(serde_json::json!({
        "process": context.process,
        "participants": context.participants,
        "capabilities": context.capabilities,
        "pools": pools,
        "offered_actions": offered,
    })))
}

#[derive(serde::Deserialize)]
pub struct StartBody {
    pub unit_codes: Vec<i64>,
}

/// POST /api/processes/:id/start — start a created process against the
/// given units.
pub async fn start_process(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StartBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.unit_codes.is_empty() {
        return Err(AppError::bad_request("unit_codes must not be empty"));
    }
    let context = app.store.start_process(id, &body.unit_codes).await?;
    Ok(Json(serde_json::json!({
        "process": context.process,
        "participants": context.participants,
    })))
}

/// POST /api/processes/:id/finalize — finish the process and put every
/// homologated map in force.
pub async fn finalize_process(
    State(app): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    app.engine().finalize(id).await?;
    let context = app.store.fetch_context(id).await?;
    Ok(Json(serde_json::json!({ "process": context.process })))
}

#[derive(serde::Deserialize)]
pub struct BulkBody {
    pub action: BulkAction,
    pub unit_codes: Vec<i64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

/// POST /api/processes/:id/bulk — apply one workflow transition to many
/// eligible units at once.
pub async fn bulk_action(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<BulkBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut request = BulkActionRequest::new(body.action, body.unit_codes);
    if let Some(deadline) = body.deadline {
        request = request.with_deadline(deadline);
    }
    let outcome = app.executor().execute(id, request).await?;
    Ok(Json(serde_json::json!({
        "action": outcome.action,
        "succeeded": outcome.succeeded,
        "participants": outcome.context.participants,
    })))
}
