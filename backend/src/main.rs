use axum::{http::Method, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod jobs;
mod notifications;
mod services;
mod workflows;

pub use error::{ApiError, ApiResult, AppError};

#[cfg(test)]
mod tests;

pub struct AppState {
    pub records: Arc<dyn services::RecordApi>,
    pub workflows: Arc<workflows::WorkflowStore>,
    pub engine: Arc<workflows::WorkflowEngine>,
    pub audit: Arc<services::AuditService>,
    pub bulk: Arc<services::BulkOperationsService>,
    pub notifications: Arc<notifications::NotificationStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;

    let records: Arc<dyn services::RecordApi> = Arc::new(services::InMemoryRecords::new());
    let notifications = Arc::new(notifications::NotificationStore::new());
    let audit = Arc::new(services::AuditService::new());
    let workflow_store = Arc::new(workflows::WorkflowStore::new());
    let executor = workflows::ActionExecutor::new(records.clone(), notifications.clone());
    let engine = Arc::new(workflows::WorkflowEngine::new(
        workflow_store.clone(),
        executor,
        audit.clone(),
    ));
    let bulk = Arc::new(services::BulkOperationsService::new(records.clone()));

    let app_state = Arc::new(AppState {
        records,
        workflows: workflow_store,
        engine,
        audit,
        bulk,
        notifications,
    });

    // Keep the scheduler handle alive for the lifetime of the server
    let _scheduler = jobs::start(app_state.clone(), config.jobs.clone()).await?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "Dernek Panel API v1.0.0" }))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1/workflows", handlers::workflows::workflow_routes())
        .nest("/api/v1/events", handlers::workflows::event_routes())
        .nest("/api/v1/audit-logs", handlers::audit_logs::audit_log_routes())
        .nest(
            "/api/v1/bulk-operations",
            handlers::bulk_operations::bulk_operation_routes(),
        )
        .nest(
            "/api/v1/notifications",
            notifications::notification_routes(),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!("Server running on {}", config.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
