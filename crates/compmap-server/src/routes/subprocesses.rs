use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use compmap_core::store::SubprocessStore;
use compmap_core::types::Role;
use compmap_core::workflow::{Actor, TransitionPayload, WorkflowAction};
use std::str::FromStr;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/subprocesses/:id — current state of one subprocess.
pub async fn get_subprocess(
    State(app): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let sp = app.store.fetch(id).await?;
    Ok(Json(serde_json::json!({ "subprocess": sp })))
}

#[derive(serde::Deserialize)]
pub struct TransitionBody {
    /// Acting role; session handling is outside this service, so the
    /// caller states who is acting.
    pub role: String,
    #[serde(default)]
    pub unit_code: Option<i64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

/// POST /api/subprocesses/:id/transitions/:action — apply one workflow
/// transition.
pub async fn transition(
    State(app): State<AppState>,
    Path((id, action)): Path<(i64, String)>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let action = WorkflowAction::from_str(&action)?;
    let role = Role::from_str(&body.role)?;
    let actor = Actor {
        role,
        unit_code: body.unit_code.unwrap_or(0),
    };
    let payload = TransitionPayload {
        deadline: body.deadline,
        note: body.note,
    };

    let sp = app.engine().apply(id, action, actor, payload).await?;
    Ok(Json(serde_json::json!({ "subprocess": sp })))
}
