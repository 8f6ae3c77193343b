// Action Executor - dispatches and runs individual workflow actions

use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tracing::info;

use super::actions::{ActionKind, WorkflowActionConfig};
use crate::notifications::NotificationStore;
use crate::services::records::{RecordApi, RecordError};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Unknown action type: {0}")]
    UnknownAction(String),
    #[error("Unsupported entity type: {0}")]
    UnsupportedEntity(String),
    #[error("Missing action parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid action parameter {0}: {1}")]
    InvalidParameter(&'static str, String),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Executes workflow actions against the injected collaborators.
///
/// `create_task` and `update_status` perform real record writes;
/// `send_notification` delivers through the in-app notification store; the
/// remaining handlers are logging stubs until their integrations land.
pub struct ActionExecutor {
    records: Arc<dyn RecordApi>,
    notifications: Arc<NotificationStore>,
}

impl ActionExecutor {
    pub fn new(records: Arc<dyn RecordApi>, notifications: Arc<NotificationStore>) -> Self {
        Self {
            records,
            notifications,
        }
    }

    /// Execute a single action. The returned value becomes the action's
    /// output slot in the execution record.
    pub async fn execute_action(
        &self,
        action: &WorkflowActionConfig,
        input: &Value,
    ) -> Result<Value, WorkflowError> {
        let kind = ActionKind::from_tag(&action.action_type)
            .ok_or_else(|| WorkflowError::UnknownAction(action.action_type.clone()))?;

        info!("Executing action: {}", kind.as_str());

        let params = expand_templates(&action.parameters, input);

        match kind {
            ActionKind::SendNotification => self.execute_send_notification(&params, input).await,
            ActionKind::CreateTask => self.execute_create_task(&params, input).await,
            ActionKind::AssignUser => self.execute_assign_user(&params).await,
            ActionKind::UpdateStatus => self.execute_update_status(&params).await,
            ActionKind::SendEmail => self.execute_send_email(&params).await,
            ActionKind::SendSms => self.execute_send_sms(&params).await,
            ActionKind::GenerateReport => self.execute_generate_report(&params).await,
            ActionKind::MoveToStage => self.execute_move_to_stage(&params).await,
        }
    }

    async fn execute_send_notification(
        &self,
        params: &Value,
        input: &Value,
    ) -> Result<Value, WorkflowError> {
        let user_id = params["user_id"]
            .as_str()
            .or_else(|| input["assigned_to"].as_str())
            .unwrap_or("admin");
        let notification_type = params["type"].as_str().unwrap_or("info");
        let title = params["title"]
            .as_str()
            .ok_or(WorkflowError::MissingParameter("title"))?;
        let message = params["message"].as_str().unwrap_or("");

        let notification = self
            .notifications
            .create(user_id, title, message, notification_type, None, None)
            .await;

        Ok(serde_json::json!({
            "notification_id": notification.id,
            "user_id": user_id,
            "type": notification_type
        }))
    }

    async fn execute_create_task(
        &self,
        params: &Value,
        input: &Value,
    ) -> Result<Value, WorkflowError> {
        let title = params["title"]
            .as_str()
            .ok_or(WorkflowError::MissingParameter("title"))?;
        // Fall back to the trigger payload's description when the action
        // config carries none.
        let description = params["description"]
            .as_str()
            .or_else(|| input["description"].as_str());

        let task_data = serde_json::json!({
            "title": title,
            "description": description,
            "assigned_to": params["assigned_to"].as_str(),
            "priority": params["priority"].as_str().unwrap_or("normal"),
            "status": "pending",
            "created_by": "workflow-system"
        });

        let created = self.records.create_task(task_data).await?;
        Ok(created)
    }

    async fn execute_assign_user(&self, params: &Value) -> Result<Value, WorkflowError> {
        let entity_type = params["entity_type"].as_str().unwrap_or_default();
        let entity_id = params["entity_id"].as_str().unwrap_or_default();
        let user_id = params["user_id"]
            .as_str()
            .ok_or(WorkflowError::MissingParameter("user_id"))?;
        let role = params["role"].as_str().unwrap_or("assignee");

        // Assignment records are not persisted yet; the entity update goes
        // through update_status/bulk assign paths.
        info!(
            "Assigning user {} to {} {} as {}",
            user_id, entity_type, entity_id, role
        );

        Ok(serde_json::json!({
            "success": true,
            "entity_type": entity_type,
            "entity_id": entity_id,
            "user_id": user_id,
            "role": role
        }))
    }

    async fn execute_update_status(&self, params: &Value) -> Result<Value, WorkflowError> {
        let entity_type = params["entity_type"]
            .as_str()
            .ok_or(WorkflowError::MissingParameter("entity_type"))?;
        let raw_id = params["entity_id"]
            .as_str()
            .ok_or(WorkflowError::MissingParameter("entity_id"))?;
        let entity_id = uuid::Uuid::parse_str(raw_id)
            .map_err(|e| WorkflowError::InvalidParameter("entity_id", e.to_string()))?;
        let status = params["status"]
            .as_str()
            .ok_or(WorkflowError::MissingParameter("status"))?;

        let patch = serde_json::json!({ "status": status });
        let updated = match entity_type {
            "task" => self.records.update_task(entity_id, patch).await?,
            "meeting" => self.records.update_meeting(entity_id, patch).await?,
            other => return Err(WorkflowError::UnsupportedEntity(other.to_string())),
        };

        Ok(updated)
    }

    async fn execute_send_email(&self, params: &Value) -> Result<Value, WorkflowError> {
        let to = params["to"].as_str().unwrap_or_default();
        let subject = params["subject"].as_str().unwrap_or_default();
        let template = params["template"].as_str().unwrap_or_default();

        // Stub until an email provider is wired in.
        info!("Sending email to {} ({}) using template {}", to, subject, template);

        Ok(serde_json::json!({ "success": true, "to": to, "subject": subject }))
    }

    async fn execute_send_sms(&self, params: &Value) -> Result<Value, WorkflowError> {
        let to = params["to"].as_str().unwrap_or_default();
        let message = params["message"].as_str().unwrap_or_default();

        // Stub until an SMS provider is wired in.
        info!("Sending SMS to {}: {}", to, message);

        Ok(serde_json::json!({ "success": true, "to": to }))
    }

    async fn execute_generate_report(&self, params: &Value) -> Result<Value, WorkflowError> {
        let report_type = params["type"].as_str().unwrap_or("summary");
        let format = params["format"].as_str().unwrap_or("pdf");

        info!("Generating {} report as {}", report_type, format);

        Ok(serde_json::json!({ "success": true, "type": report_type, "format": format }))
    }

    async fn execute_move_to_stage(&self, params: &Value) -> Result<Value, WorkflowError> {
        let application_id = params["application_id"].as_str().unwrap_or_default();
        let stage = params["stage"]
            .as_str()
            .ok_or(WorkflowError::MissingParameter("stage"))?;

        info!("Moving application {} to stage {}", application_id, stage);

        Ok(serde_json::json!({ "success": true, "application_id": application_id, "stage": stage }))
    }
}

fn template_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("valid template pattern"))
}

/// Expand `{{field}}` placeholders in action parameters against the trigger
/// payload. Unresolvable placeholders are left untouched.
pub fn expand_templates(params: &Value, input: &Value) -> Value {
    match params {
        Value::String(s) => Value::String(replace_template_vars(s, input)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), expand_templates(v, input)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| expand_templates(v, input)).collect()),
        _ => params.clone(),
    }
}

fn replace_template_vars(template: &str, input: &Value) -> String {
    let mut result = template.to_string();

    for cap in template_pattern().captures_iter(template) {
        let var_path = cap[1].trim();
        let value = get_nested_value(input, var_path);

        if let Some(val) = value {
            let replacement = match val {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            result = result.replace(&cap[0], &replacement);
        }
    }

    result
}

fn get_nested_value(json: &Value, path: &str) -> Option<Value> {
    let mut current = json;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current.clone())
}
