// Record API - document-store collaborator for workflow actions and bulk
// operations. The shipped implementation is the in-memory stand-in for the
// upstream document database; the trait is the substitution seam.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Invalid record data: {0}")]
    Invalid(String),
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Entity collections the platform manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Beneficiary,
    Donation,
    AidApplication,
    Meeting,
    Task,
    Document,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Beneficiary => "beneficiary",
            Self::Donation => "donation",
            Self::AidApplication => "aid_application",
            Self::Meeting => "meeting",
            Self::Task => "task",
            Self::Document => "document",
        }
    }
}

/// CRUD collaborator over the platform's record collections.
///
/// A returned `RecordError` is treated as action failure by the workflow
/// engine and as a per-item failure by the bulk runner.
#[async_trait]
pub trait RecordApi: Send + Sync {
    async fn create_task(&self, data: Value) -> RecordResult<Value>;
    async fn update_task(&self, id: Uuid, patch: Value) -> RecordResult<Value>;
    async fn update_meeting(&self, id: Uuid, patch: Value) -> RecordResult<Value>;

    async fn get_record(&self, entity: EntityType, id: Uuid) -> RecordResult<Value>;
    async fn update_record(&self, entity: EntityType, id: Uuid, patch: Value) -> RecordResult<Value>;
    async fn delete_record(&self, entity: EntityType, id: Uuid) -> RecordResult<()>;
    async fn list_records(&self, entity: EntityType) -> RecordResult<Vec<Value>>;
}

/// In-memory record store keyed by entity collection and id
#[derive(Default)]
pub struct InMemoryRecords {
    inner: RwLock<HashMap<(EntityType, Uuid), Value>>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, assigning an id when the payload carries none.
    pub async fn insert(&self, entity: EntityType, mut value: Value) -> RecordResult<Uuid> {
        let obj = value
            .as_object_mut()
            .ok_or_else(|| RecordError::Invalid("record must be a JSON object".to_string()))?;

        let id = match obj.get("id").and_then(|v| v.as_str()) {
            Some(raw) => Uuid::parse_str(raw)
                .map_err(|_| RecordError::Invalid(format!("invalid record id: {raw}")))?,
            None => {
                let id = Uuid::new_v4();
                obj.insert("id".to_string(), Value::String(id.to_string()));
                id
            }
        };

        self.inner.write().await.insert((entity, id), value);
        Ok(id)
    }
}

fn merge_patch(record: &mut Value, patch: &Value) -> RecordResult<()> {
    let target = record
        .as_object_mut()
        .ok_or_else(|| RecordError::Invalid("stored record is not an object".to_string()))?;
    let fields = patch
        .as_object()
        .ok_or_else(|| RecordError::Invalid("patch must be a JSON object".to_string()))?;

    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
    target.insert(
        "updated_at".to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    Ok(())
}

#[async_trait]
impl RecordApi for InMemoryRecords {
    async fn create_task(&self, mut data: Value) -> RecordResult<Value> {
        let obj = data
            .as_object_mut()
            .ok_or_else(|| RecordError::Invalid("task data must be a JSON object".to_string()))?;

        let id = Uuid::new_v4();
        obj.insert("id".to_string(), Value::String(id.to_string()));
        obj.insert(
            "created_at".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );

        self.inner
            .write()
            .await
            .insert((EntityType::Task, id), data.clone());
        Ok(data)
    }

    async fn update_task(&self, id: Uuid, patch: Value) -> RecordResult<Value> {
        self.update_record(EntityType::Task, id, patch).await
    }

    async fn update_meeting(&self, id: Uuid, patch: Value) -> RecordResult<Value> {
        self.update_record(EntityType::Meeting, id, patch).await
    }

    async fn get_record(&self, entity: EntityType, id: Uuid) -> RecordResult<Value> {
        self.inner
            .read()
            .await
            .get(&(entity, id))
            .cloned()
            .ok_or(RecordError::NotFound {
                entity: entity.as_str(),
                id,
            })
    }

    async fn update_record(&self, entity: EntityType, id: Uuid, patch: Value) -> RecordResult<Value> {
        let mut records = self.inner.write().await;
        let record = records.get_mut(&(entity, id)).ok_or(RecordError::NotFound {
            entity: entity.as_str(),
            id,
        })?;
        merge_patch(record, &patch)?;
        Ok(record.clone())
    }

    async fn delete_record(&self, entity: EntityType, id: Uuid) -> RecordResult<()> {
        self.inner
            .write()
            .await
            .remove(&(entity, id))
            .map(|_| ())
            .ok_or(RecordError::NotFound {
                entity: entity.as_str(),
                id,
            })
    }

    async fn list_records(&self, entity: EntityType) -> RecordResult<Vec<Value>> {
        Ok(self
            .inner
            .read()
            .await
            .iter()
            .filter(|((e, _), _)| *e == entity)
            .map(|(_, v)| v.clone())
            .collect())
    }
}
