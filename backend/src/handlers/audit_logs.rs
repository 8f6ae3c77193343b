use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::services::audit::{AuditAction, AuditEntryBuilder, AuditLogFilters};
use crate::AppState;

pub fn audit_log_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_audit_logs))
        .route("/stats", get(get_audit_stats))
        .route("/export", get(export_audit_logs))
}

async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<AuditLogFilters>,
) -> impl IntoResponse {
    Json(state.audit.search(&filters).await)
}

async fn get_audit_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.audit.stats().await)
}

async fn export_audit_logs(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<AuditLogFilters>,
) -> impl IntoResponse {
    let csv = state.audit.export_csv(&filters).await;

    state
        .audit
        .log(
            AuditEntryBuilder::new(AuditAction::DataExported)
                .resource("audit_logs", "export")
                .details(serde_json::json!({ "format": "csv" })),
        )
        .await;

    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"audit-logs.csv\"",
            ),
        ],
        csv,
    )
}
