use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiResult, AppError};
use crate::services::audit::{AuditAction, AuditEntryBuilder};
use crate::services::bulk::{BulkAction, BulkError, BulkStatus};
use crate::services::records::EntityType;
use crate::AppState;

pub fn bulk_operation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_operations).post(create_operation))
        .route("/:id", get(get_operation))
        .route("/:id/cancel", post(cancel_operation))
}

impl From<BulkError> for AppError {
    fn from(err: BulkError) -> Self {
        match err {
            BulkError::Validation(errors) => {
                let mut details = HashMap::new();
                details.insert("operation".to_string(), errors);
                AppError::ValidationError { details }
            }
            BulkError::NotFound => AppError::NotFound("Bulk operation".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBulkOperationRequest {
    pub entity_type: EntityType,
    pub action: BulkAction,
    pub entity_ids: Vec<Uuid>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ListOperationsQuery {
    pub status: Option<BulkStatus>,
}

async fn create_operation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateBulkOperationRequest>,
) -> ApiResult<impl IntoResponse> {
    let operation = state
        .bulk
        .create_operation(
            request.entity_type,
            request.action,
            request.entity_ids,
            request.data,
        )
        .await?;

    state
        .audit
        .log(
            AuditEntryBuilder::new(AuditAction::BulkOperation)
                .resource("bulk_operation", &operation.id.to_string())
                .details(serde_json::json!({
                    "entity_type": operation.entity_type,
                    "action": operation.action,
                    "total": operation.total
                })),
        )
        .await;

    // Run in the background; clients poll the operation for progress.
    let bulk = state.bulk.clone();
    let id = operation.id;
    tokio::spawn(async move {
        if let Err(e) = bulk.execute(id).await {
            tracing::error!("Bulk operation {} failed to run: {}", id, e);
        }
    });

    Ok((StatusCode::ACCEPTED, Json(operation)))
}

async fn list_operations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOperationsQuery>,
) -> impl IntoResponse {
    let operations = match query.status {
        Some(status) => state.bulk.get_by_status(status).await,
        None => state.bulk.get_all().await,
    };
    Json(operations)
}

async fn get_operation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let operation = state
        .bulk
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound("Bulk operation".to_string()))?;
    Ok(Json(operation))
}

async fn cancel_operation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let operation = state.bulk.cancel(id).await?;
    Ok(Json(operation))
}
