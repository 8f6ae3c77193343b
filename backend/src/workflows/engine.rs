// Workflow Engine - Core workflow execution and bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::actions::{ActionOutput, WorkflowActionConfig};
use super::conditions::{evaluate_conditions, WorkflowCondition};
use super::executor::ActionExecutor;
use super::store::WorkflowStore;
use super::triggers::{TriggerEvent, WorkflowTrigger};
use crate::services::audit::{AuditAction, AuditEntryBuilder, AuditService};

/// A stored automation rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub trigger: WorkflowTrigger,
    pub conditions: Vec<WorkflowCondition>,
    pub actions: Vec<WorkflowActionConfig>,
    pub status: WorkflowStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub execution_count: u64,
    pub last_executed: Option<DateTime<Utc>>,
    pub is_enabled: bool,
}

impl Workflow {
    /// Whether the engine will run this workflow at all
    pub fn is_runnable(&self) -> bool {
        self.is_enabled && self.status == WorkflowStatus::Active
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Active,
    Inactive,
    Draft,
    Testing,
}

/// Immutable record of one engine run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub trigger: WorkflowTrigger,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub input: Value,
    /// One slot per executed action, in listed order
    #[serde(default)]
    pub output: Vec<ActionOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Success,
    Failed,
    /// The workflow was not runnable (disabled or non-active status)
    Skipped,
}

/// Fixed error string for the condition-gated exit; callers distinguish it
/// from genuine action failures by this sentinel.
pub const CONDITIONS_NOT_MET: &str = "Conditions not met";

pub struct WorkflowEngine {
    store: Arc<WorkflowStore>,
    executor: ActionExecutor,
    audit: Arc<AuditService>,
}

impl WorkflowEngine {
    pub fn new(store: Arc<WorkflowStore>, executor: ActionExecutor, audit: Arc<AuditService>) -> Self {
        Self {
            store,
            executor,
            audit,
        }
    }

    /// Execute a workflow against an input payload.
    ///
    /// Never returns an error: every failure mode is captured in the
    /// returned execution record. Actions run strictly in listed order and
    /// the first failing action aborts the remainder (no rollback of
    /// already-applied actions).
    pub async fn execute_workflow(&self, workflow: &Workflow, input: Value) -> WorkflowExecution {
        let mut execution = WorkflowExecution {
            id: Uuid::new_v4(),
            workflow_id: workflow.id,
            trigger: workflow.trigger,
            status: ExecutionStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            input,
            output: Vec::new(),
            error: None,
        };

        info!("Executing workflow '{}'", workflow.name);

        if !workflow.is_runnable() {
            execution.status = ExecutionStatus::Skipped;
            execution.error = Some("Workflow is not active".to_string());
            return self.finish(workflow, execution).await;
        }

        if !evaluate_conditions(&workflow.conditions, &execution.input) {
            execution.status = ExecutionStatus::Failed;
            execution.error = Some(CONDITIONS_NOT_MET.to_string());
            return self.finish(workflow, execution).await;
        }

        for (step, action) in workflow.actions.iter().enumerate() {
            match self.executor.execute_action(action, &execution.input).await {
                Ok(value) => {
                    execution.output.push(ActionOutput {
                        step,
                        action: action.action_type.clone(),
                        value,
                    });
                }
                Err(e) => {
                    warn!(
                        "Workflow '{}' failed at action {} ({}): {}",
                        workflow.name, step, action.action_type, e
                    );
                    execution.status = ExecutionStatus::Failed;
                    execution.error = Some(e.to_string());
                    return self.finish(workflow, execution).await;
                }
            }
        }

        execution.status = ExecutionStatus::Success;
        self.finish(workflow, execution).await
    }

    /// Run every runnable workflow whose trigger matches the event.
    ///
    /// This is the caller-side trigger selection; direct `execute_workflow`
    /// performs no trigger check.
    pub async fn process_event(&self, event: &TriggerEvent) -> Vec<WorkflowExecution> {
        let workflows = self.store.get_all().await;
        let mut executions = Vec::new();

        info!("Processing event: {:?}", event.trigger);

        for workflow in workflows
            .iter()
            .filter(|w| w.is_runnable() && w.trigger == event.trigger)
        {
            let execution = self.execute_workflow(workflow, event.payload.clone()).await;
            executions.push(execution);
        }

        executions
    }

    async fn finish(&self, workflow: &Workflow, mut execution: WorkflowExecution) -> WorkflowExecution {
        execution.completed_at = Some(Utc::now());
        self.store.record_execution(&execution).await;

        let entry = AuditEntryBuilder::new(AuditAction::WorkflowExecuted)
            .resource("workflow", &workflow.id.to_string())
            .details(serde_json::json!({
                "workflow_name": workflow.name.clone(),
                "execution_id": execution.id,
                "status": execution.status,
                "error": execution.error.clone(),
            }));
        let entry = if execution.status == ExecutionStatus::Failed {
            entry.warning()
        } else {
            entry
        };
        self.audit.log(entry).await;

        execution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationStore;
    use crate::services::records::InMemoryRecords;
    use crate::workflows::store::CreateWorkflow;
    use serde_json::json;

    fn engine() -> (Arc<WorkflowEngine>, Arc<WorkflowStore>) {
        let store = Arc::new(WorkflowStore::new());
        let records = Arc::new(InMemoryRecords::new());
        let notifications = Arc::new(NotificationStore::new());
        let executor = ActionExecutor::new(records, notifications);
        let audit = Arc::new(AuditService::new());
        (
            Arc::new(WorkflowEngine::new(store.clone(), executor, audit)),
            store,
        )
    }

    fn noop_workflow(trigger: WorkflowTrigger) -> CreateWorkflow {
        CreateWorkflow {
            name: "Noop".to_string(),
            description: String::new(),
            trigger,
            conditions: vec![],
            actions: vec![WorkflowActionConfig::send_sms("{{phone}}", "merhaba")],
        }
    }

    #[tokio::test]
    async fn test_disabled_workflow_is_skipped() {
        let (engine, store) = engine();
        let mut workflow = store
            .create(noop_workflow(WorkflowTrigger::Custom), "tester")
            .await;
        workflow.is_enabled = false;

        let execution = engine.execute_workflow(&workflow, json!({})).await;
        assert_eq!(execution.status, ExecutionStatus::Skipped);
        assert_eq!(execution.error.as_deref(), Some("Workflow is not active"));
        assert!(execution.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_draft_workflow_is_skipped() {
        let (engine, store) = engine();
        let mut workflow = store
            .create(noop_workflow(WorkflowTrigger::Custom), "tester")
            .await;
        workflow.status = WorkflowStatus::Draft;

        let execution = engine.execute_workflow(&workflow, json!({})).await;
        assert_eq!(execution.status, ExecutionStatus::Skipped);

        // Skipped runs do not count as executions
        assert_eq!(store.get(workflow.id).await.unwrap().execution_count, 0);
    }

    #[tokio::test]
    async fn test_process_event_selects_matching_triggers() {
        let (engine, store) = engine();
        store
            .create(noop_workflow(WorkflowTrigger::DonationReceived), "tester")
            .await;
        store
            .create(noop_workflow(WorkflowTrigger::MeetingScheduled), "tester")
            .await;

        let event = TriggerEvent::new(
            WorkflowTrigger::DonationReceived,
            json!({"amount": "100"}),
            crate::workflows::triggers::EventSource::Api,
        );
        let executions = engine.process_event(&event).await;

        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].trigger, WorkflowTrigger::DonationReceived);
        assert_eq!(executions[0].status, ExecutionStatus::Success);
    }

    #[tokio::test]
    async fn test_process_event_ignores_disabled_workflows() {
        let (engine, store) = engine();
        let workflow = store
            .create(noop_workflow(WorkflowTrigger::Custom), "tester")
            .await;
        store
            .update(
                workflow.id,
                crate::workflows::store::UpdateWorkflow {
                    is_enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let event = TriggerEvent::new(
            WorkflowTrigger::Custom,
            json!({}),
            crate::workflows::triggers::EventSource::Api,
        );
        assert!(engine.process_event(&event).await.is_empty());
    }
}
