use axum::Json;
use serde_json::{Value, json};

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up")),
    tag = "health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
