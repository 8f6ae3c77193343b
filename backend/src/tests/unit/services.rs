// Cross-service behavior: engine + records + notifications + audit + jobs

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::jobs::scheduler::run_deadline_scan;
use crate::notifications::NotificationStore;
use crate::services::audit::{AuditAction, AuditLogFilters, AuditService};
use crate::services::bulk::{BulkAction, BulkOperationsService, BulkStatus};
use crate::services::records::{EntityType, InMemoryRecords, RecordApi};
use crate::workflows::{
    templates, ActionExecutor, CreateWorkflow, ExecutionStatus, TriggerEvent,
    WorkflowActionConfig, WorkflowEngine, WorkflowStore, WorkflowTrigger,
};
use crate::AppState;
use dernek_shared::{AidApplication, Beneficiary, Donation, Meeting, Task};

struct Platform {
    records: Arc<InMemoryRecords>,
    notifications: Arc<NotificationStore>,
    audit: Arc<AuditService>,
    store: Arc<WorkflowStore>,
    engine: Arc<WorkflowEngine>,
    bulk: Arc<BulkOperationsService>,
}

fn platform() -> Platform {
    let records = Arc::new(InMemoryRecords::new());
    let notifications = Arc::new(NotificationStore::new());
    let audit = Arc::new(AuditService::new());
    let store = Arc::new(WorkflowStore::new());
    let executor = ActionExecutor::new(records.clone(), notifications.clone());
    let engine = Arc::new(WorkflowEngine::new(store.clone(), executor, audit.clone()));
    let bulk = Arc::new(BulkOperationsService::new(records.clone()));

    Platform {
        records,
        notifications,
        audit,
        store,
        engine,
        bulk,
    }
}

#[tokio::test]
async fn beneficiary_welcome_template_runs_end_to_end() {
    let platform = platform();
    platform
        .store
        .create(templates::beneficiary_welcome(), "admin")
        .await;

    let event = TriggerEvent::beneficiary_created(
        uuid::Uuid::new_v4(),
        "Ayşe Yılmaz",
        "AKTIF",
        "user-1",
    );
    let executions = platform.engine.process_event(&event).await;

    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, ExecutionStatus::Success);

    // The template created a follow-up task...
    let tasks = platform.records.list_records(EntityType::Task).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Yeni İhtiyaç Sahibini Görüşme");
    assert_eq!(tasks[0]["created_by"], "workflow-system");

    // ...and delivered an in-app notification with the expanded template
    let delivered = platform
        .notifications
        .list_for_user("admin", None, None, 1, 10)
        .await;
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].message.contains("Ayşe Yılmaz"));
}

#[tokio::test]
async fn welcome_template_skips_inactive_beneficiaries() {
    let platform = platform();
    platform
        .store
        .create(templates::beneficiary_welcome(), "admin")
        .await;

    let event =
        TriggerEvent::beneficiary_created(uuid::Uuid::new_v4(), "Veli Kaya", "PASIF", "user-1");
    let executions = platform.engine.process_event(&event).await;

    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, ExecutionStatus::Failed);
    assert_eq!(executions[0].error.as_deref(), Some("Conditions not met"));
    assert!(platform
        .records
        .list_records(EntityType::Task)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn engine_runs_feed_audit_statistics() {
    let platform = platform();
    let workflow = platform
        .store
        .create(templates::donation_receipt(), "admin")
        .await;

    for _ in 0..3 {
        platform
            .engine
            .execute_workflow(
                &workflow,
                json!({"status": "completed", "donor_email": "a@b.com"}),
            )
            .await;
    }

    let stats = platform.audit.stats().await;
    assert_eq!(stats.by_action.get("workflow_executed"), Some(&3));
    assert_eq!(stats.total_logs, 3);

    let filters = AuditLogFilters {
        action: Some(AuditAction::WorkflowExecuted),
        limit: Some(2),
        ..Default::default()
    };
    assert_eq!(platform.audit.search(&filters).await.len(), 2);
}

#[tokio::test]
async fn bulk_assign_updates_task_records() {
    let platform = platform();
    let mut ids = Vec::new();
    for i in 0..3 {
        let id = platform
            .records
            .insert(
                EntityType::Task,
                json!({"title": format!("Görev {i}"), "status": "pending"}),
            )
            .await
            .unwrap();
        ids.push(id);
    }

    let operation = platform
        .bulk
        .create_operation(
            EntityType::Task,
            BulkAction::Assign,
            ids.clone(),
            Some(json!({"assignee_id": "user-5"})),
        )
        .await
        .unwrap();
    let finished = platform.bulk.execute(operation.id).await.unwrap();

    assert_eq!(finished.status, BulkStatus::Completed);
    assert_eq!(finished.succeeded, 3);

    for id in ids {
        let task = platform.records.get_record(EntityType::Task, id).await.unwrap();
        assert_eq!(task["assigned_to"], "user-5");
    }
}

#[tokio::test]
async fn donation_receipt_template_runs_for_completed_donations() {
    let platform = platform();
    platform
        .store
        .create(templates::donation_receipt(), "admin")
        .await;

    let donation = Donation {
        id: Uuid::new_v4(),
        donor_name: "Mehmet Öz".to_string(),
        donor_email: Some("mehmet@example.com".to_string()),
        donor_phone: None,
        amount: Decimal::new(25000, 2),
        currency: "TRY".to_string(),
        donation_type: "cash".to_string(),
        status: "completed".to_string(),
        received_at: Utc::now(),
        receipt_sent: false,
        notes: None,
        created_at: Utc::now(),
        updated_at: None,
    };

    let event = TriggerEvent::donation_received(
        donation.id,
        &donation.donor_name,
        donation.donor_email.as_deref(),
        donation.amount,
        &donation.status,
    );
    let executions = platform.engine.process_event(&event).await;

    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, ExecutionStatus::Success);

    // The template's second action created the follow-up task
    let tasks = platform.records.list_records(EntityType::Task).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Bağış Takibi");
}

#[tokio::test]
async fn aid_application_review_template_moves_to_under_review() {
    let platform = platform();
    platform
        .store
        .create(templates::aid_application_review(), "admin")
        .await;

    let application = AidApplication {
        id: Uuid::new_v4(),
        beneficiary_id: Uuid::new_v4(),
        aid_type: "financial".to_string(),
        stage: "draft".to_string(),
        priority: "high".to_string(),
        amount_requested: Some(Decimal::new(150000, 2)),
        description: None,
        form_data: Some(json!({"household_income": 9500})),
        submitted_at: Utc::now(),
        decided_at: None,
        decided_by: None,
        created_at: Utc::now(),
        updated_at: None,
    };

    let event = TriggerEvent::aid_application_submitted(
        application.id,
        application.beneficiary_id,
        &application.aid_type,
        &application.stage,
        &application.priority,
    );
    let executions = platform.engine.process_event(&event).await;

    assert_eq!(executions.len(), 1);
    let execution = &executions[0];
    assert_eq!(execution.status, ExecutionStatus::Success);
    assert_eq!(execution.output.len(), 3);
    assert_eq!(execution.output[1].action, "move_to_stage");
    assert_eq!(execution.output[1].value["stage"], "under_review");
}

#[tokio::test]
async fn status_update_workflow_cancels_meeting_record() {
    let platform = platform();

    let meeting = Meeting {
        id: Uuid::new_v4(),
        title: "Yönetim Kurulu Toplantısı".to_string(),
        description: None,
        scheduled_at: Utc::now(),
        location: Some("Merkez".to_string()),
        organizer: "admin".to_string(),
        participants: vec!["user-1".to_string()],
        status: "scheduled".to_string(),
        created_at: Utc::now(),
        updated_at: None,
    };
    let id = platform
        .records
        .insert(EntityType::Meeting, serde_json::to_value(&meeting).unwrap())
        .await
        .unwrap();

    let workflow = platform
        .store
        .create(
            CreateWorkflow {
                name: "Toplantı İptali".to_string(),
                description: String::new(),
                trigger: WorkflowTrigger::Custom,
                conditions: vec![],
                actions: vec![WorkflowActionConfig::update_status(
                    "meeting",
                    "{{meeting_id}}",
                    "cancelled",
                )],
            },
            "admin",
        )
        .await;

    let execution = platform
        .engine
        .execute_workflow(&workflow, json!({"meeting_id": id.to_string()}))
        .await;

    assert_eq!(execution.status, ExecutionStatus::Success);
    let stored = platform
        .records
        .get_record(EntityType::Meeting, id)
        .await
        .unwrap();
    assert_eq!(stored["status"], "cancelled");
}

#[tokio::test]
async fn bulk_export_renders_beneficiary_csv() {
    let platform = platform();
    let mut ids = Vec::new();
    for name in ["Ali Demir", "Ayşe Kaya"] {
        let beneficiary = Beneficiary {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            national_id: None,
            phone: None,
            email: None,
            address: None,
            city: Some("Ankara".to_string()),
            family_size: Some(4),
            status: "AKTIF".to_string(),
            notes: None,
            created_by: "admin".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        let id = platform
            .records
            .insert(
                EntityType::Beneficiary,
                serde_json::to_value(&beneficiary).unwrap(),
            )
            .await
            .unwrap();
        ids.push(id);
    }

    let operation = platform
        .bulk
        .create_operation(EntityType::Beneficiary, BulkAction::Export, ids, None)
        .await
        .unwrap();
    let finished = platform.bulk.execute(operation.id).await.unwrap();

    assert_eq!(finished.status, BulkStatus::Completed);
    let csv = finished.result.unwrap()["csv"].as_str().unwrap().to_string();
    assert!(csv.contains("full_name"));
    assert!(csv.contains("Ali Demir"));
    assert!(csv.contains("Ayşe Kaya"));
}

#[tokio::test]
async fn deadline_scan_fires_reminder_workflows() {
    let platform = platform();
    platform
        .store
        .create(templates::task_deadline_reminder(), "admin")
        .await;

    let task = Task {
        id: Uuid::new_v4(),
        title: "Saha ziyareti".to_string(),
        description: None,
        assigned_to: Some("user-9".to_string()),
        priority: "high".to_string(),
        status: "pending".to_string(),
        due_date: Some(Utc::now().date_naive() + chrono::Duration::days(1)),
        created_by: "admin".to_string(),
        created_at: Utc::now(),
        updated_at: None,
    };
    platform
        .records
        .insert(EntityType::Task, serde_json::to_value(&task).unwrap())
        .await
        .unwrap();

    // A completed task in the window must not fire
    let done = Task {
        id: Uuid::new_v4(),
        status: "completed".to_string(),
        ..task.clone()
    };
    platform
        .records
        .insert(EntityType::Task, serde_json::to_value(&done).unwrap())
        .await
        .unwrap();

    let records: Arc<dyn RecordApi> = platform.records.clone();
    let state = AppState {
        records,
        workflows: platform.store.clone(),
        engine: platform.engine.clone(),
        audit: platform.audit.clone(),
        bulk: platform.bulk.clone(),
        notifications: platform.notifications.clone(),
    };

    run_deadline_scan(&state, 2).await;

    let executions = platform.store.list_executions(None).await;
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, ExecutionStatus::Success);
    // Reminder notification fell back to the task assignee
    assert_eq!(platform.notifications.unread_count("user-9").await, 1);
}
