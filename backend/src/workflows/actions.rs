// Workflow Actions - Units of work executed by workflows

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One configured action in a workflow.
///
/// The action tag is carried as a string because workflow definitions
/// arrive as JSON; the executor parses it into an `ActionKind` and raises
/// the configuration-error path for unknown tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowActionConfig {
    #[serde(rename = "type")]
    pub action_type: String,
    /// Free-form parameters specific to the action type. `{{field}}`
    /// placeholders are expanded against the trigger payload before
    /// dispatch.
    #[serde(default)]
    pub parameters: Value,
}

/// Recognized action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    SendNotification,
    CreateTask,
    AssignUser,
    UpdateStatus,
    SendEmail,
    SendSms,
    GenerateReport,
    MoveToStage,
}

impl ActionKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "send_notification" => Some(Self::SendNotification),
            "create_task" => Some(Self::CreateTask),
            "assign_user" => Some(Self::AssignUser),
            "update_status" => Some(Self::UpdateStatus),
            "send_email" => Some(Self::SendEmail),
            "send_sms" => Some(Self::SendSms),
            "generate_report" => Some(Self::GenerateReport),
            "move_to_stage" => Some(Self::MoveToStage),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendNotification => "send_notification",
            Self::CreateTask => "create_task",
            Self::AssignUser => "assign_user",
            Self::UpdateStatus => "update_status",
            Self::SendEmail => "send_email",
            Self::SendSms => "send_sms",
            Self::GenerateReport => "generate_report",
            Self::MoveToStage => "move_to_stage",
        }
    }
}

/// Output of one executed action. Keyed by step index so two actions of
/// the same type in one workflow keep separate slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutput {
    pub step: usize,
    pub action: String,
    pub value: Value,
}

impl WorkflowActionConfig {
    pub fn new(action_type: &str, parameters: Value) -> Self {
        Self {
            action_type: action_type.to_string(),
            parameters,
        }
    }

    // ===== Action Builders =====

    pub fn send_notification(notification_type: &str, title: &str, message: &str) -> Self {
        Self::new(
            "send_notification",
            serde_json::json!({
                "type": notification_type,
                "title": title,
                "message": message
            }),
        )
    }

    pub fn create_task(title: &str, description: &str, priority: &str) -> Self {
        Self::new(
            "create_task",
            serde_json::json!({
                "title": title,
                "description": description,
                "priority": priority
            }),
        )
    }

    pub fn assign_user(entity_type: &str, user_id: &str, role: &str) -> Self {
        Self::new(
            "assign_user",
            serde_json::json!({
                "entity_type": entity_type,
                "user_id": user_id,
                "role": role
            }),
        )
    }

    pub fn update_status(entity_type: &str, entity_id: &str, status: &str) -> Self {
        Self::new(
            "update_status",
            serde_json::json!({
                "entity_type": entity_type,
                "entity_id": entity_id,
                "status": status
            }),
        )
    }

    pub fn send_email(to: &str, subject: &str, template: &str, data: Value) -> Self {
        Self::new(
            "send_email",
            serde_json::json!({
                "to": to,
                "subject": subject,
                "template": template,
                "data": data
            }),
        )
    }

    pub fn send_sms(to: &str, message: &str) -> Self {
        Self::new(
            "send_sms",
            serde_json::json!({
                "to": to,
                "message": message
            }),
        )
    }

    pub fn generate_report(report_type: &str, format: &str, filters: Value) -> Self {
        Self::new(
            "generate_report",
            serde_json::json!({
                "type": report_type,
                "format": format,
                "filters": filters
            }),
        )
    }

    pub fn move_to_stage(stage: &str) -> Self {
        Self::new(
            "move_to_stage",
            serde_json::json!({
                "stage": stage
            }),
        )
    }
}
