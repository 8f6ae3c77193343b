use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    routing::{delete, get, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ApiResult, AppError};
use crate::AppState;
use dernek_shared::Notification;

/// In-app notification store. Stands in for the notifications collection;
/// the workflow executor delivers `send_notification` actions through it.
#[derive(Default)]
pub struct NotificationStore {
    inner: RwLock<Vec<Notification>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        notification_type: &str,
        entity_type: Option<String>,
        entity_id: Option<Uuid>,
    ) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            notification_type: notification_type.to_string(),
            entity_type,
            entity_id,
            read: false,
            created_at: Utc::now(),
        };

        self.inner.write().await.push(notification.clone());
        notification
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        read: Option<bool>,
        notification_type: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Vec<Notification> {
        let notifications = self.inner.read().await;
        let mut matching: Vec<Notification> = notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| read.map_or(true, |r| n.read == r))
            .filter(|n| notification_type.map_or(true, |t| n.notification_type == t))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let offset = ((page.max(1) - 1) * limit) as usize;
        matching.into_iter().skip(offset).take(limit as usize).collect()
    }

    pub async fn mark_as_read(&self, id: Uuid, user_id: &str) -> ApiResult<()> {
        let mut notifications = self.inner.write().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Notification".to_string()))?;
        notification.read = true;
        Ok(())
    }

    pub async fn mark_all_as_read(&self, user_id: &str) -> u64 {
        let mut notifications = self.inner.write().await;
        let mut updated = 0;
        for notification in notifications.iter_mut() {
            if notification.user_id == user_id && !notification.read {
                notification.read = true;
                updated += 1;
            }
        }
        updated
    }

    pub async fn delete(&self, id: Uuid, user_id: &str) -> ApiResult<()> {
        let mut notifications = self.inner.write().await;
        let before = notifications.len();
        notifications.retain(|n| !(n.id == id && n.user_id == user_id));
        if notifications.len() == before {
            return Err(AppError::NotFound("Notification".to_string()));
        }
        Ok(())
    }

    pub async fn unread_count(&self, user_id: &str) -> i64 {
        self.inner
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64
    }
}

pub fn notification_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", put(mark_as_read))
        .route("/read-all", put(mark_all_as_read))
        .route("/:id", delete(delete_notification))
        .route("/unread-count", get(get_unread_count))
}

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub user_id: String,
    pub read: Option<bool>,
    pub notification_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    #[serde(flatten)]
    pub notification: Notification,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListNotificationsQuery>,
) -> impl IntoResponse {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(50).min(100);

    let notifications = state
        .notifications
        .list_for_user(
            &query.user_id,
            query.read,
            query.notification_type.as_deref(),
            page,
            limit,
        )
        .await;

    let responses: Vec<NotificationResponse> = notifications
        .into_iter()
        .map(|notification| NotificationResponse {
            relative_time: format_relative_time(notification.created_at),
            notification,
        })
        .collect();

    Json(responses)
}

async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<impl IntoResponse> {
    state.notifications.mark_as_read(id, &query.user_id).await?;
    Ok(Json(serde_json::json!({ "message": "Notification marked as read" })))
}

async fn mark_all_as_read(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> impl IntoResponse {
    let updated = state.notifications.mark_all_as_read(&query.user_id).await;
    Json(serde_json::json!({
        "message": "All notifications marked as read",
        "updated_count": updated
    }))
}

async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<impl IntoResponse> {
    state.notifications.delete(id, &query.user_id).await?;
    Ok(Json(serde_json::json!({ "message": "Notification deleted" })))
}

async fn get_unread_count(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> impl IntoResponse {
    let unread_count = state.notifications.unread_count(&query.user_id).await;
    Json(UnreadCountResponse { unread_count })
}

fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(timestamp);

    if duration.num_minutes() < 1 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        format!("{} minutes ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{} hours ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{} days ago", duration.num_days())
    } else if duration.num_days() < 30 {
        format!("{} weeks ago", duration.num_days() / 7)
    } else if duration.num_days() < 365 {
        format!("{} months ago", duration.num_days() / 30)
    } else {
        format!("{} years ago", duration.num_days() / 365)
    }
}
