use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiResult, AppError};
use crate::services::audit::{AuditAction, AuditEntryBuilder};
use crate::workflows::{
    templates, CreateWorkflow, EventSource, TriggerEvent, UpdateWorkflow, WorkflowActionConfig,
    WorkflowCondition, WorkflowTrigger,
};
use crate::AppState;

pub fn workflow_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_workflows).post(create_workflow))
        .route("/templates", get(list_templates))
        .route("/executions", get(list_all_executions))
        .route(
            "/:id",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
        .route("/:id/execute", post(execute_workflow))
        .route("/:id/executions", get(list_workflow_executions))
}

pub fn event_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(fire_event))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkflowRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger: WorkflowTrigger,
    #[serde(default)]
    pub conditions: Vec<WorkflowCondition>,
    #[serde(default)]
    pub actions: Vec<WorkflowActionConfig>,
    /// Actor id from the auth layer; defaults to "system" until sessions
    /// are wired through.
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FireEventRequest {
    pub trigger: WorkflowTrigger,
    #[serde(default)]
    pub payload: Value,
}

async fn list_workflows(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.workflows.get_all().await)
}

async fn create_workflow(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateWorkflowRequest>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    let created_by = request.created_by.unwrap_or_else(|| "system".to_string());
    let workflow = state
        .workflows
        .create(
            CreateWorkflow {
                name: request.name,
                description: request.description,
                trigger: request.trigger,
                conditions: request.conditions,
                actions: request.actions,
            },
            &created_by,
        )
        .await;

    state
        .audit
        .log(
            AuditEntryBuilder::new(AuditAction::WorkflowCreated)
                .actor(&created_by, None)
                .resource("workflow", &workflow.id.to_string()),
        )
        .await;

    Ok((StatusCode::CREATED, Json(workflow)))
}

async fn get_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let workflow = state
        .workflows
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound("Workflow".to_string()))?;
    Ok(Json(workflow))
}

async fn update_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateWorkflow>,
) -> ApiResult<impl IntoResponse> {
    let workflow = state.workflows.update(id, patch).await?;

    state
        .audit
        .log(
            AuditEntryBuilder::new(AuditAction::WorkflowUpdated)
                .resource("workflow", &workflow.id.to_string()),
        )
        .await;

    Ok(Json(workflow))
}

async fn delete_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.workflows.delete(id).await?;

    state
        .audit
        .log(
            AuditEntryBuilder::new(AuditAction::WorkflowDeleted)
                .resource("workflow", &id.to_string())
                .warning(),
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Workflow deleted" })))
}

/// Manually execute a workflow against an arbitrary payload (used by the
/// workflow test screen).
async fn execute_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(input): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let workflow = state
        .workflows
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound("Workflow".to_string()))?;

    let execution = state.engine.execute_workflow(&workflow, input).await;
    Ok(Json(execution))
}

async fn list_workflow_executions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    Json(state.workflows.list_executions(Some(id)).await)
}

async fn list_all_executions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.workflows.list_executions(None).await)
}

async fn list_templates() -> impl IntoResponse {
    Json(templates::all())
}

/// Fire a trigger event through every matching workflow
async fn fire_event(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FireEventRequest>,
) -> impl IntoResponse {
    let event = TriggerEvent::new(request.trigger, request.payload, EventSource::Api);
    let executions = state.engine.process_event(&event).await;
    Json(serde_json::json!({
        "event_id": event.event_id,
        "executions": executions
    }))
}
