// Engine-level behavior of the workflow automation system

use serde_json::json;
use std::sync::Arc;

use crate::tests::fixtures::{engine_with_records, CountingRecords};
use crate::workflows::{
    CreateWorkflow, ExecutionStatus, WorkflowActionConfig, WorkflowCondition, WorkflowTrigger,
    CONDITIONS_NOT_MET,
};

fn workflow_with(
    conditions: Vec<WorkflowCondition>,
    actions: Vec<WorkflowActionConfig>,
) -> CreateWorkflow {
    CreateWorkflow {
        name: "Test Workflow".to_string(),
        description: String::new(),
        trigger: WorkflowTrigger::Custom,
        conditions,
        actions,
    }
}

#[tokio::test]
async fn failing_condition_blocks_actions_entirely() {
    let records = Arc::new(CountingRecords::new());
    let ctx = engine_with_records(records.clone());

    let workflow = ctx
        .store
        .create(
            workflow_with(
                vec![WorkflowCondition::equals("status", json!("AKTIF"))],
                vec![
                    WorkflowActionConfig::create_task("Görüşme", "planla", "normal"),
                    WorkflowActionConfig::send_notification("info", "Yeni kayıt", "mesaj"),
                ],
            ),
            "tester",
        )
        .await;

    let execution = ctx
        .engine
        .execute_workflow(&workflow, json!({"status": "PASIF"}))
        .await;

    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(execution.error.as_deref(), Some(CONDITIONS_NOT_MET));
    assert!(execution.completed_at.is_some());
    // No collaborator was invoked
    assert_eq!(records.create_task_count(), 0);
    assert_eq!(ctx.notifications.unread_count("admin").await, 0);
}

#[tokio::test]
async fn unknown_action_type_fails_the_execution() {
    let ctx = engine_with_records(Arc::new(CountingRecords::new()));

    let workflow = ctx
        .store
        .create(
            workflow_with(
                vec![],
                vec![WorkflowActionConfig::new("unknown_action", json!({}))],
            ),
            "tester",
        )
        .await;

    let execution = ctx.engine.execute_workflow(&workflow, json!({})).await;

    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert!(execution
        .error
        .as_deref()
        .unwrap()
        .contains("Unknown action type"));
}

#[tokio::test]
async fn failing_action_aborts_remaining_actions() {
    let records = Arc::new(CountingRecords::failing_create_task());
    let ctx = engine_with_records(records.clone());

    let workflow = ctx
        .store
        .create(
            workflow_with(
                vec![],
                vec![
                    WorkflowActionConfig::create_task("Görev", "ilk adım", "normal"),
                    WorkflowActionConfig::update_status(
                        "task",
                        &uuid::Uuid::new_v4().to_string(),
                        "completed",
                    ),
                ],
            ),
            "tester",
        )
        .await;

    let execution = ctx.engine.execute_workflow(&workflow, json!({})).await;

    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(records.create_task_count(), 1);
    // Action 2 never ran
    assert_eq!(records.update_task_count(), 0);
    assert!(execution.output.is_empty());
}

#[tokio::test]
async fn successful_run_sets_all_bookkeeping_fields() {
    let ctx = engine_with_records(Arc::new(CountingRecords::new()));

    let workflow = ctx
        .store
        .create(
            workflow_with(
                vec![],
                vec![
                    WorkflowActionConfig::create_task("Görev", "adım", "high"),
                    WorkflowActionConfig::send_sms("{{phone}}", "hatırlatma"),
                ],
            ),
            "tester",
        )
        .await;

    let input = json!({"phone": "0555 000 0000", "description": "detay"});
    let execution = ctx.engine.execute_workflow(&workflow, input.clone()).await;

    assert_eq!(execution.status, ExecutionStatus::Success);
    assert!(execution.error.is_none());
    assert_eq!(execution.input, input);
    assert_eq!(execution.workflow_id, workflow.id);
    assert_eq!(execution.trigger, workflow.trigger);

    let completed_at = execution.completed_at.expect("completed_at must be set");
    assert!(completed_at >= execution.started_at);

    // One output slot per action, in order
    assert_eq!(execution.output.len(), 2);
    assert_eq!(execution.output[0].step, 0);
    assert_eq!(execution.output[0].action, "create_task");
    assert_eq!(execution.output[1].step, 1);
    assert_eq!(execution.output[1].action, "send_sms");

    // Bookkeeping persisted through the store
    let stored = ctx.store.get(workflow.id).await.unwrap();
    assert_eq!(stored.execution_count, 1);
    assert_eq!(stored.last_executed, Some(execution.started_at));
    assert_eq!(ctx.store.list_executions(Some(workflow.id)).await.len(), 1);
}

#[tokio::test]
async fn duplicate_action_types_keep_separate_output_slots() {
    let ctx = engine_with_records(Arc::new(CountingRecords::new()));

    let workflow = ctx
        .store
        .create(
            workflow_with(
                vec![],
                vec![
                    WorkflowActionConfig::send_sms("111", "birinci"),
                    WorkflowActionConfig::send_sms("222", "ikinci"),
                ],
            ),
            "tester",
        )
        .await;

    let execution = ctx.engine.execute_workflow(&workflow, json!({})).await;

    assert_eq!(execution.status, ExecutionStatus::Success);
    assert_eq!(execution.output.len(), 2);
    assert_eq!(execution.output[0].value["to"], "111");
    assert_eq!(execution.output[1].value["to"], "222");
}

#[tokio::test]
async fn every_execution_is_audited() {
    let ctx = engine_with_records(Arc::new(CountingRecords::new()));

    let workflow = ctx
        .store
        .create(workflow_with(vec![], vec![]), "tester")
        .await;
    ctx.engine.execute_workflow(&workflow, json!({})).await;

    let filters = crate::services::audit::AuditLogFilters {
        action: Some(crate::services::audit::AuditAction::WorkflowExecuted),
        ..Default::default()
    };
    let entries = ctx.audit.search(&filters).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].resource.as_deref(), Some("workflow"));
}

#[tokio::test]
async fn concurrent_executions_increment_counter_exactly() {
    const RUNS: usize = 50;

    let ctx = engine_with_records(Arc::new(CountingRecords::new()));
    let workflow = ctx
        .store
        .create(
            workflow_with(vec![], vec![WorkflowActionConfig::send_sms("1", "m")]),
            "tester",
        )
        .await;

    let mut handles = Vec::with_capacity(RUNS);
    for _ in 0..RUNS {
        let engine = ctx.engine.clone();
        let workflow = workflow.clone();
        handles.push(tokio::spawn(async move {
            engine.execute_workflow(&workflow, json!({})).await
        }));
    }

    for handle in handles {
        let execution = handle.await.expect("task panicked");
        assert_eq!(execution.status, ExecutionStatus::Success);
    }

    // No lost updates: each successful run bumped the counter exactly once
    let stored = ctx.store.get(workflow.id).await.unwrap();
    assert_eq!(stored.execution_count, RUNS as u64);
    assert!(stored.last_executed.is_some());
    assert_eq!(ctx.store.list_executions(Some(workflow.id)).await.len(), RUNS);
}
