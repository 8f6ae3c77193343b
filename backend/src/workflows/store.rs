// Workflow Store - CRUD over workflow definitions and execution records.
//
// In-memory stand-in for the workflows collection. Last write wins; the
// only cross-invocation guarantee is the atomic execution bookkeeping in
// `record_execution`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::actions::WorkflowActionConfig;
use super::conditions::WorkflowCondition;
use super::engine::{ExecutionStatus, Workflow, WorkflowExecution, WorkflowStatus};
use super::triggers::WorkflowTrigger;
use crate::error::{ApiResult, AppError};

/// Payload for creating a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflow {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger: WorkflowTrigger,
    #[serde(default)]
    pub conditions: Vec<WorkflowCondition>,
    #[serde(default)]
    pub actions: Vec<WorkflowActionConfig>,
}

/// Partial update of a workflow definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWorkflow {
    pub name: Option<String>,
    pub description: Option<String>,
    pub trigger: Option<WorkflowTrigger>,
    pub conditions: Option<Vec<WorkflowCondition>>,
    pub actions: Option<Vec<WorkflowActionConfig>>,
    pub status: Option<WorkflowStatus>,
    pub is_enabled: Option<bool>,
}

#[derive(Default)]
pub struct WorkflowStore {
    workflows: RwLock<HashMap<Uuid, Workflow>>,
    executions: RwLock<Vec<WorkflowExecution>>,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new workflow. New workflows start active and enabled.
    pub async fn create(&self, data: CreateWorkflow, created_by: &str) -> Workflow {
        let now = Utc::now();
        let workflow = Workflow {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            trigger: data.trigger,
            conditions: data.conditions,
            actions: data.actions,
            status: WorkflowStatus::Active,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
            execution_count: 0,
            last_executed: None,
            is_enabled: true,
        };

        self.workflows
            .write()
            .await
            .insert(workflow.id, workflow.clone());
        workflow
    }

    pub async fn get_all(&self) -> Vec<Workflow> {
        let mut workflows: Vec<Workflow> = self.workflows.read().await.values().cloned().collect();
        workflows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        workflows
    }

    pub async fn get(&self, id: Uuid) -> Option<Workflow> {
        self.workflows.read().await.get(&id).cloned()
    }

    /// Update a workflow. Fails with a not-found error for an unknown id;
    /// a silent no-op here would hide misdirected updates.
    pub async fn update(&self, id: Uuid, patch: UpdateWorkflow) -> ApiResult<Workflow> {
        let mut workflows = self.workflows.write().await;
        let workflow = workflows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Workflow".to_string()))?;

        if let Some(name) = patch.name {
            workflow.name = name;
        }
        if let Some(description) = patch.description {
            workflow.description = description;
        }
        if let Some(trigger) = patch.trigger {
            workflow.trigger = trigger;
        }
        if let Some(conditions) = patch.conditions {
            workflow.conditions = conditions;
        }
        if let Some(actions) = patch.actions {
            workflow.actions = actions;
        }
        if let Some(status) = patch.status {
            workflow.status = status;
        }
        if let Some(is_enabled) = patch.is_enabled {
            workflow.is_enabled = is_enabled;
        }
        workflow.updated_at = Utc::now();

        Ok(workflow.clone())
    }

    /// Hard delete. Past executions remain as the durable record of what
    /// ran.
    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.workflows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Workflow".to_string()))
    }

    /// Append an execution record. For successful runs the workflow's
    /// execution counter and last-executed timestamp are bumped under the
    /// same write lock, so concurrent invocations never lose an update.
    pub async fn record_execution(&self, execution: &WorkflowExecution) {
        {
            let mut workflows = self.workflows.write().await;
            if execution.status == ExecutionStatus::Success {
                if let Some(workflow) = workflows.get_mut(&execution.workflow_id) {
                    workflow.execution_count += 1;
                    workflow.last_executed = Some(execution.started_at);
                }
            }
        }

        self.executions.write().await.push(execution.clone());
    }

    /// List executions, newest first, optionally scoped to one workflow.
    pub async fn list_executions(&self, workflow_id: Option<Uuid>) -> Vec<WorkflowExecution> {
        let executions = self.executions.read().await;
        let mut matching: Vec<WorkflowExecution> = executions
            .iter()
            .filter(|e| workflow_id.map_or(true, |id| e.workflow_id == id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        matching
    }
}
