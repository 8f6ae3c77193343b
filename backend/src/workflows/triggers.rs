// Workflow Triggers - Event types that can trigger workflow execution

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Categories of events a workflow can be associated with.
///
/// The engine does not enforce the trigger/workflow match on direct
/// execution; `WorkflowEngine::process_event` performs the caller-side
/// selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowTrigger {
    BeneficiaryCreated,
    DonationReceived,
    AidApplicationSubmitted,
    TaskAssigned,
    MeetingScheduled,
    DeadlineApproaching,
    Custom,
}

/// Payload for trigger events
pub type EventPayload = serde_json::Value;

/// A trigger event that can initiate workflow execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub event_id: Uuid,
    pub trigger: WorkflowTrigger,
    pub payload: EventPayload,
    pub source: EventSource,
    pub timestamp: DateTime<Utc>,
}

/// Source of the trigger event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventSource {
    System,
    User(String),
    Api,
    Scheduler,
}

impl TriggerEvent {
    /// Create a new trigger event
    pub fn new(trigger: WorkflowTrigger, payload: EventPayload, source: EventSource) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            trigger,
            payload,
            source,
            timestamp: Utc::now(),
        }
    }

    /// Create a beneficiary created event
    pub fn beneficiary_created(
        beneficiary_id: Uuid,
        full_name: &str,
        status: &str,
        created_by: &str,
    ) -> Self {
        Self::new(
            WorkflowTrigger::BeneficiaryCreated,
            serde_json::json!({
                "beneficiary_id": beneficiary_id,
                "full_name": full_name,
                "status": status,
                "created_by": created_by
            }),
            EventSource::User(created_by.to_string()),
        )
    }

    /// Create a donation received event
    pub fn donation_received(
        donation_id: Uuid,
        donor_name: &str,
        donor_email: Option<&str>,
        amount: rust_decimal::Decimal,
        status: &str,
    ) -> Self {
        Self::new(
            WorkflowTrigger::DonationReceived,
            serde_json::json!({
                "donation_id": donation_id,
                "donor_name": donor_name,
                "donor_email": donor_email,
                "amount": amount.to_string(),
                "status": status
            }),
            EventSource::System,
        )
    }

    /// Create an aid application submitted event
    pub fn aid_application_submitted(
        application_id: Uuid,
        beneficiary_id: Uuid,
        aid_type: &str,
        stage: &str,
        priority: &str,
    ) -> Self {
        Self::new(
            WorkflowTrigger::AidApplicationSubmitted,
            serde_json::json!({
                "application_id": application_id,
                "beneficiary_id": beneficiary_id,
                "aid_type": aid_type,
                "stage": stage,
                "priority": priority
            }),
            EventSource::System,
        )
    }

    /// Create a task assigned event
    pub fn task_assigned(task_id: Uuid, title: &str, assigned_to: &str, assigned_by: &str) -> Self {
        Self::new(
            WorkflowTrigger::TaskAssigned,
            serde_json::json!({
                "task_id": task_id,
                "title": title,
                "assigned_to": assigned_to,
                "assigned_by": assigned_by
            }),
            EventSource::User(assigned_by.to_string()),
        )
    }

    /// Create a meeting scheduled event
    pub fn meeting_scheduled(
        meeting_id: Uuid,
        title: &str,
        scheduled_at: DateTime<Utc>,
        organizer: &str,
    ) -> Self {
        Self::new(
            WorkflowTrigger::MeetingScheduled,
            serde_json::json!({
                "meeting_id": meeting_id,
                "title": title,
                "scheduled_at": scheduled_at,
                "organizer": organizer
            }),
            EventSource::User(organizer.to_string()),
        )
    }

    /// Create a deadline approaching event for a task nearing its due date
    pub fn deadline_approaching(
        task_id: Uuid,
        title: &str,
        due_date: NaiveDate,
        days_until_due: i64,
        assigned_to: Option<&str>,
    ) -> Self {
        Self::new(
            WorkflowTrigger::DeadlineApproaching,
            serde_json::json!({
                "task_id": task_id,
                "title": title,
                "due_date": due_date,
                "days_until_due": days_until_due,
                "assigned_to": assigned_to
            }),
            EventSource::Scheduler,
        )
    }
}
