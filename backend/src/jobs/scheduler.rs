// Job Scheduler - periodic deadline scanning and retention cleanup

use std::sync::Arc;
use thiserror::Error;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::JobSettings;
use crate::services::records::{EntityType, RecordApi};
use crate::workflows::TriggerEvent;
use crate::AppState;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

pub type JobResult<T> = Result<T, JobError>;

/// Register and start the background jobs. The returned scheduler must be
/// kept alive for the jobs to keep firing.
pub async fn start(state: Arc<AppState>, settings: JobSettings) -> JobResult<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let deadline_cron = format!(
        "0 0 */{} * * *",
        settings.deadline_scan_interval_hours.max(1)
    );
    let deadline_state = state.clone();
    let warning_days = settings.deadline_warning_days;
    scheduler
        .add(Job::new_async(deadline_cron.as_str(), move |_id, _sched| {
            let state = deadline_state.clone();
            Box::pin(async move {
                run_deadline_scan(&state, warning_days).await;
            })
        })?)
        .await?;

    let cleanup_cron = format!("0 30 */{} * * *", settings.cleanup_interval_hours.max(1));
    let cleanup_state = state.clone();
    let audit_retention = settings.audit_log_retention_days;
    let bulk_retention = settings.bulk_operation_retention_days;
    scheduler
        .add(Job::new_async(cleanup_cron.as_str(), move |_id, _sched| {
            let state = cleanup_state.clone();
            Box::pin(async move {
                run_retention_cleanup(&state, audit_retention, bulk_retention).await;
            })
        })?)
        .await?;

    scheduler.start().await?;
    info!("Background jobs scheduled");

    Ok(scheduler)
}

/// Fire a deadline_approaching event for every open task due within the
/// warning window.
pub async fn run_deadline_scan(state: &AppState, warning_days: i64) {
    let tasks = match state.records.list_records(EntityType::Task).await {
        Ok(tasks) => tasks,
        Err(e) => {
            error!("Deadline scan failed to list tasks: {}", e);
            return;
        }
    };

    let today = chrono::Utc::now().date_naive();
    let mut fired = 0;

    for task in tasks {
        let Some(due_raw) = task["due_date"].as_str() else {
            continue;
        };
        let Ok(due) = chrono::NaiveDate::parse_from_str(due_raw, "%Y-%m-%d") else {
            continue;
        };

        let status = task["status"].as_str().unwrap_or_default();
        if status == "completed" || status == "cancelled" {
            continue;
        }

        let days_until_due = (due - today).num_days();
        if days_until_due < 0 || days_until_due > warning_days {
            continue;
        }

        let Some(task_id) = task["id"].as_str().and_then(|s| Uuid::parse_str(s).ok()) else {
            continue;
        };

        let event = TriggerEvent::deadline_approaching(
            task_id,
            task["title"].as_str().unwrap_or_default(),
            due,
            days_until_due,
            task["assigned_to"].as_str(),
        );
        let executions = state.engine.process_event(&event).await;
        fired += executions.len();
    }

    info!("Deadline scan completed, {} workflow executions fired", fired);
}

pub async fn run_retention_cleanup(state: &AppState, audit_retention: i64, bulk_retention: i64) {
    let removed_audit = state.audit.cleanup(audit_retention).await;
    let removed_bulk = state.bulk.cleanup(bulk_retention).await;
    info!(
        "Retention cleanup removed {} audit entries and {} bulk operations",
        removed_audit, removed_bulk
    );
}
