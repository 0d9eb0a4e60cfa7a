use axum::extract::State;
use axum::Json;
use compmap_core::store::UnitStore;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/units — the full organizational forest.
pub async fn get_units(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let roots = app.store.fetch_tree(&[]).await?;
    Ok(Json(serde_json::json!({ "units": roots })))
}
