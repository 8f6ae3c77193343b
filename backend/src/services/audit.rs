// Audit logging service for activity tracking across the platform.
// Entries live in the in-memory store standing in for the audit_logs
// collection; critical entries are additionally surfaced through tracing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Authentication
    Login,
    Logout,
    LoginFailed,
    PasswordChanged,

    // Beneficiaries
    BeneficiaryCreated,
    BeneficiaryUpdated,
    BeneficiaryDeleted,

    // Donations
    DonationCreated,
    DonationUpdated,
    DonationApproved,
    DonationRejected,

    // Aid applications
    AidApplicationCreated,
    AidApplicationApproved,
    AidApplicationRejected,

    // Meetings
    MeetingCreated,
    MeetingCancelled,

    // Tasks
    TaskCreated,
    TaskCompleted,
    TaskAssigned,

    // Documents
    DocumentUploaded,
    DocumentDeleted,

    // Workflows
    WorkflowCreated,
    WorkflowUpdated,
    WorkflowDeleted,
    WorkflowExecuted,

    // System
    BulkOperation,
    DataExported,
    SettingsUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::LoginFailed => "login_failed",
            Self::PasswordChanged => "password_changed",
            Self::BeneficiaryCreated => "beneficiary_created",
            Self::BeneficiaryUpdated => "beneficiary_updated",
            Self::BeneficiaryDeleted => "beneficiary_deleted",
            Self::DonationCreated => "donation_created",
            Self::DonationUpdated => "donation_updated",
            Self::DonationApproved => "donation_approved",
            Self::DonationRejected => "donation_rejected",
            Self::AidApplicationCreated => "aid_application_created",
            Self::AidApplicationApproved => "aid_application_approved",
            Self::AidApplicationRejected => "aid_application_rejected",
            Self::MeetingCreated => "meeting_created",
            Self::MeetingCancelled => "meeting_cancelled",
            Self::TaskCreated => "task_created",
            Self::TaskCompleted => "task_completed",
            Self::TaskAssigned => "task_assigned",
            Self::DocumentUploaded => "document_uploaded",
            Self::DocumentDeleted => "document_deleted",
            Self::WorkflowCreated => "workflow_created",
            Self::WorkflowUpdated => "workflow_updated",
            Self::WorkflowDeleted => "workflow_deleted",
            Self::WorkflowExecuted => "workflow_executed",
            Self::BulkOperation => "bulk_operation",
            Self::DataExported => "data_exported",
            Self::SettingsUpdated => "settings_updated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl Default for AuditSeverity {
    fn default() -> Self {
        Self::Info
    }
}

/// One recorded activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub action: AuditAction,
    pub severity: AuditSeverity,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub details: Option<JsonValue>,
    pub old_values: Option<JsonValue>,
    pub new_values: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
}

/// Builder for audit entries
pub struct AuditEntryBuilder {
    user_id: Option<String>,
    user_email: Option<String>,
    action: AuditAction,
    severity: AuditSeverity,
    resource: Option<String>,
    resource_id: Option<String>,
    details: Option<JsonValue>,
    old_values: Option<JsonValue>,
    new_values: Option<JsonValue>,
}

impl AuditEntryBuilder {
    pub fn new(action: AuditAction) -> Self {
        Self {
            user_id: None,
            user_email: None,
            action,
            severity: AuditSeverity::default(),
            resource: None,
            resource_id: None,
            details: None,
            old_values: None,
            new_values: None,
        }
    }

    pub fn actor(mut self, user_id: &str, email: Option<String>) -> Self {
        self.user_id = Some(user_id.to_string());
        self.user_email = email;
        self
    }

    pub fn resource(mut self, resource: &str, resource_id: &str) -> Self {
        self.resource = Some(resource.to_string());
        self.resource_id = Some(resource_id.to_string());
        self
    }

    pub fn details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub fn changes(mut self, old_values: JsonValue, new_values: JsonValue) -> Self {
        self.old_values = Some(old_values);
        self.new_values = Some(new_values);
        self
    }

    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn warning(mut self) -> Self {
        self.severity = AuditSeverity::Warning;
        self
    }

    pub fn critical(mut self) -> Self {
        self.severity = AuditSeverity::Critical;
        self
    }
}

/// Filters for searching the audit log
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuditLogFilters {
    pub user_id: Option<String>,
    pub action: Option<AuditAction>,
    pub severity: Option<AuditSeverity>,
    pub resource: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogStats {
    pub total_logs: usize,
    pub by_action: HashMap<String, u64>,
    pub by_severity: HashMap<String, u64>,
    pub by_user: HashMap<String, u64>,
    pub recent_activity: Vec<AuditEntry>,
}

#[derive(Default)]
pub struct AuditService {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry built with `AuditEntryBuilder`
    pub async fn log(&self, builder: AuditEntryBuilder) -> AuditEntry {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            user_id: builder.user_id,
            user_email: builder.user_email,
            action: builder.action,
            severity: builder.severity,
            resource: builder.resource,
            resource_id: builder.resource_id,
            details: builder.details,
            old_values: builder.old_values,
            new_values: builder.new_values,
            timestamp: Utc::now(),
        };

        if entry.severity == AuditSeverity::Critical {
            tracing::error!(
                action = entry.action.as_str(),
                user = entry.user_id.as_deref().unwrap_or("-"),
                "critical audit event"
            );
        }

        self.entries.write().await.push(entry.clone());
        entry
    }

    /// Search entries, newest first
    pub async fn search(&self, filters: &AuditLogFilters) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        let mut matching: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| {
                filters
                    .user_id
                    .as_ref()
                    .map_or(true, |u| e.user_id.as_ref() == Some(u))
            })
            .filter(|e| filters.action.map_or(true, |a| e.action == a))
            .filter(|e| filters.severity.map_or(true, |s| e.severity == s))
            .filter(|e| {
                filters
                    .resource
                    .as_ref()
                    .map_or(true, |r| e.resource.as_ref() == Some(r))
            })
            .filter(|e| filters.from.map_or(true, |from| e.timestamp >= from))
            .filter(|e| filters.to.map_or(true, |to| e.timestamp <= to))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let page = filters.page.unwrap_or(1).max(1);
        let limit = filters.limit.unwrap_or(50).min(500) as usize;
        let offset = (page as usize - 1) * limit;
        matching.into_iter().skip(offset).take(limit).collect()
    }

    /// Aggregate statistics over the full log
    pub async fn stats(&self) -> AuditLogStats {
        let entries = self.entries.read().await;

        let mut by_action: HashMap<String, u64> = HashMap::new();
        let mut by_severity: HashMap<String, u64> = HashMap::new();
        let mut by_user: HashMap<String, u64> = HashMap::new();

        for entry in entries.iter() {
            *by_action.entry(entry.action.as_str().to_string()).or_default() += 1;
            *by_severity
                .entry(entry.severity.as_str().to_string())
                .or_default() += 1;
            if let Some(user) = &entry.user_id {
                *by_user.entry(user.clone()).or_default() += 1;
            }
        }

        let mut recent: Vec<AuditEntry> = entries.iter().cloned().collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(10);

        AuditLogStats {
            total_logs: entries.len(),
            by_action,
            by_severity,
            by_user,
            recent_activity: recent,
        }
    }

    /// Render matching entries as CSV for export
    pub async fn export_csv(&self, filters: &AuditLogFilters) -> String {
        let mut filters = filters.clone();
        filters.page = Some(1);
        filters.limit = Some(500);
        let entries = self.search(&filters).await;

        let mut csv = String::from("timestamp,user,action,resource,severity,details\n");
        for entry in entries {
            let details = entry
                .details
                .map(|d| d.to_string().replace('"', "\"\""))
                .unwrap_or_default();
            csv.push_str(&format!(
                "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\n",
                entry.timestamp.to_rfc3339(),
                entry.user_email.or(entry.user_id).unwrap_or_default(),
                entry.action.as_str(),
                entry.resource.unwrap_or_default(),
                entry.severity.as_str(),
                details
            ));
        }
        csv
    }

    /// Drop entries older than the retention window; returns how many were
    /// removed.
    pub async fn cleanup(&self, retention_days: i64) -> usize {
        let cutoff = Utc::now() - chrono::Duration::days(retention_days);
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.timestamp >= cutoff);
        before - entries.len()
    }
}
