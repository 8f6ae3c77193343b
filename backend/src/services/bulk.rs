// Bulk Operations - batch actions over record collections.
//
// Each operation runs its items sequentially; a failing item is recorded
// and iteration continues (unlike the workflow engine's run-to-first-
// failure). Progress is visible through the operation record while the
// batch runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::records::{EntityType, RecordApi, RecordError};

#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error("Invalid bulk operation: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("Bulk operation not found")]
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Delete,
    Update,
    Export,
    Archive,
    Activate,
    Deactivate,
    Assign,
    Tag,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Export => "export",
            Self::Archive => "archive",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Assign => "assign",
            Self::Tag => "tag",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl BulkStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemError {
    pub entity_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOperation {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub action: BulkAction,
    pub entity_ids: Vec<Uuid>,
    pub status: BulkStatus,
    /// 0-100
    pub progress: f64,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<BulkItemError>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Actions allowed per entity collection
fn valid_actions(entity: EntityType) -> &'static [BulkAction] {
    use BulkAction::*;
    match entity {
        EntityType::User => &[Delete, Update, Export, Activate, Deactivate],
        EntityType::Beneficiary => &[Delete, Update, Export, Archive, Assign, Tag],
        EntityType::Donation => &[Delete, Update, Export, Archive],
        EntityType::AidApplication => &[Delete, Update, Export, Archive, Activate, Deactivate],
        EntityType::Meeting => &[Delete, Update, Export, Archive],
        EntityType::Task => &[Delete, Update, Export, Archive, Assign],
        EntityType::Document => &[Delete, Update, Export, Archive],
    }
}

const MAX_BATCH: usize = 1000;

pub struct BulkOperationsService {
    operations: RwLock<HashMap<Uuid, BulkOperation>>,
    records: Arc<dyn RecordApi>,
}

impl BulkOperationsService {
    pub fn new(records: Arc<dyn RecordApi>) -> Self {
        Self {
            operations: RwLock::new(HashMap::new()),
            records,
        }
    }

    /// Validate an operation before it is created
    pub fn validate(
        entity_type: EntityType,
        action: BulkAction,
        entity_ids: &[Uuid],
        data: Option<&Value>,
    ) -> Result<(), BulkError> {
        let mut errors = Vec::new();

        if entity_ids.is_empty() {
            errors.push("At least one entity must be selected".to_string());
        }
        if entity_ids.len() > MAX_BATCH {
            errors.push(format!(
                "Maximum {} entities can be processed at once",
                MAX_BATCH
            ));
        }
        if !valid_actions(entity_type).contains(&action) {
            errors.push(format!(
                "Action '{}' is not valid for '{}'",
                action.as_str(),
                entity_type.as_str()
            ));
        }

        match action {
            BulkAction::Update if data.map_or(true, |d| !d.is_object()) => {
                errors.push("Update data is required".to_string());
            }
            BulkAction::Assign if data.and_then(|d| d.get("assignee_id")).is_none() => {
                errors.push("Assignee ID is required".to_string());
            }
            BulkAction::Tag if data.and_then(|d| d.get("tags")).is_none() => {
                errors.push("Tags are required".to_string());
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BulkError::Validation(errors))
        }
    }

    /// Create a pending operation. The caller decides when to run it (the
    /// API handler spawns `execute` immediately).
    pub async fn create_operation(
        &self,
        entity_type: EntityType,
        action: BulkAction,
        entity_ids: Vec<Uuid>,
        data: Option<Value>,
    ) -> Result<BulkOperation, BulkError> {
        Self::validate(entity_type, action, &entity_ids, data.as_ref())?;

        let operation = BulkOperation {
            id: Uuid::new_v4(),
            entity_type,
            action,
            total: entity_ids.len(),
            entity_ids,
            status: BulkStatus::Pending,
            progress: 0.0,
            processed: 0,
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
            started_at: None,
            completed_at: None,
            result: None,
            data,
        };

        self.operations
            .write()
            .await
            .insert(operation.id, operation.clone());
        Ok(operation)
    }

    /// Run a pending operation to completion (or cancellation)
    pub async fn execute(&self, id: Uuid) -> Result<BulkOperation, BulkError> {
        let snapshot = self
            .operations
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(BulkError::NotFound)?;
        if snapshot.status != BulkStatus::Pending {
            return Ok(snapshot);
        }

        info!(
            "Running bulk {} on {} {} records",
            snapshot.action.as_str(),
            snapshot.total,
            snapshot.entity_type.as_str()
        );

        self.mutate(id, |op| {
            op.status = BulkStatus::Running;
            op.started_at = Some(Utc::now());
        })
        .await;

        let mut exported = Vec::new();
        for entity_id in &snapshot.entity_ids {
            if self.is_cancelled(id).await {
                break;
            }

            let outcome = self.apply(&snapshot, *entity_id).await;
            self.mutate(id, |op| {
                op.processed += 1;
                match &outcome {
                    Ok(_) => op.succeeded += 1,
                    Err(e) => {
                        op.failed += 1;
                        op.errors.push(BulkItemError {
                            entity_id: entity_id.to_string(),
                            message: e.to_string(),
                        });
                    }
                }
                op.progress = (op.processed as f64 / op.total as f64) * 100.0;
            })
            .await;

            if let Ok(Some(value)) = outcome {
                exported.push(value);
            }
        }

        let result = if snapshot.action == BulkAction::Export {
            Some(serde_json::json!({
                "filename": format!(
                    "{}s-export-{}.csv",
                    snapshot.entity_type.as_str(),
                    Utc::now().format("%Y-%m-%d")
                ),
                "csv": render_csv(&exported),
            }))
        } else {
            None
        };

        self.mutate(id, |op| {
            if op.status == BulkStatus::Running {
                op.status = BulkStatus::Completed;
                op.progress = 100.0;
            }
            op.completed_at = Some(Utc::now());
            op.result = result;
        })
        .await;

        self.get(id).await.ok_or(BulkError::NotFound)
    }

    async fn apply(
        &self,
        operation: &BulkOperation,
        entity_id: Uuid,
    ) -> Result<Option<Value>, RecordError> {
        let entity = operation.entity_type;
        let data = operation.data.clone().unwrap_or(Value::Null);

        match operation.action {
            BulkAction::Delete => self
                .records
                .delete_record(entity, entity_id)
                .await
                .map(|_| None),
            BulkAction::Export => self.records.get_record(entity, entity_id).await.map(Some),
            BulkAction::Update => self
                .records
                .update_record(entity, entity_id, data)
                .await
                .map(|_| None),
            BulkAction::Archive => self
                .records
                .update_record(entity, entity_id, serde_json::json!({"status": "archived"}))
                .await
                .map(|_| None),
            BulkAction::Activate => self
                .records
                .update_record(entity, entity_id, serde_json::json!({"is_active": true}))
                .await
                .map(|_| None),
            BulkAction::Deactivate => self
                .records
                .update_record(entity, entity_id, serde_json::json!({"is_active": false}))
                .await
                .map(|_| None),
            BulkAction::Assign => self
                .records
                .update_record(
                    entity,
                    entity_id,
                    serde_json::json!({"assigned_to": data["assignee_id"]}),
                )
                .await
                .map(|_| None),
            BulkAction::Tag => self
                .records
                .update_record(entity, entity_id, serde_json::json!({"tags": data["tags"]}))
                .await
                .map(|_| None),
        }
    }

    /// Flag a pending or running operation as cancelled; the runner stops
    /// before the next item.
    pub async fn cancel(&self, id: Uuid) -> Result<BulkOperation, BulkError> {
        let mut operations = self.operations.write().await;
        let operation = operations.get_mut(&id).ok_or(BulkError::NotFound)?;
        if !operation.status.is_terminal() {
            operation.status = BulkStatus::Cancelled;
            operation.completed_at = Some(Utc::now());
        }
        Ok(operation.clone())
    }

    pub async fn get(&self, id: Uuid) -> Option<BulkOperation> {
        self.operations.read().await.get(&id).cloned()
    }

    pub async fn get_all(&self) -> Vec<BulkOperation> {
        let mut operations: Vec<BulkOperation> =
            self.operations.read().await.values().cloned().collect();
        operations.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        operations
    }

    pub async fn get_by_status(&self, status: BulkStatus) -> Vec<BulkOperation> {
        self.get_all()
            .await
            .into_iter()
            .filter(|op| op.status == status)
            .collect()
    }

    /// Drop terminal operations older than the retention window
    pub async fn cleanup(&self, retention_days: i64) -> usize {
        let cutoff = Utc::now() - chrono::Duration::days(retention_days);
        let mut operations = self.operations.write().await;
        let before = operations.len();
        operations.retain(|_, op| {
            !(op.status.is_terminal() && op.completed_at.map_or(false, |at| at < cutoff))
        });
        before - operations.len()
    }

    async fn is_cancelled(&self, id: Uuid) -> bool {
        self.operations
            .read()
            .await
            .get(&id)
            .map_or(false, |op| op.status == BulkStatus::Cancelled)
    }

    async fn mutate(&self, id: Uuid, f: impl FnOnce(&mut BulkOperation)) {
        if let Some(operation) = self.operations.write().await.get_mut(&id) {
            f(operation);
        }
    }
}

/// Render exported records as CSV, quoting every cell
fn render_csv(records: &[Value]) -> String {
    let Some(first) = records.first().and_then(|v| v.as_object()) else {
        return String::new();
    };
    let columns: Vec<&String> = first.keys().collect();

    let mut csv = columns
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');

    for record in records {
        let row = columns
            .iter()
            .map(|column| {
                let cell = match record.get(column.as_str()) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                format!("\"{}\"", cell.replace('"', "\"\""))
            })
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&row);
        csv.push('\n');
    }
    csv
}
