use axum::response::Json;
use serde_json::json;

pub mod audit_logs;
pub mod bulk_operations;
pub mod workflows;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
