// Background Jobs
//
// Scheduled jobs for the platform: deadline scanning for tasks and
// retention cleanup, scheduled with tokio-cron-scheduler.

pub mod scheduler;

pub use scheduler::{start, JobError, JobResult};
