// Workflow Automation Engine
//
// Event-driven automation for the association management platform.
// Supports triggers, conditions, and actions for automated workflows.

pub mod actions;
pub mod conditions;
pub mod engine;
pub mod executor;
pub mod store;
pub mod templates;
pub mod triggers;

pub use actions::{ActionKind, ActionOutput, WorkflowActionConfig};
pub use conditions::{evaluate_conditions, ConditionOperator, WorkflowCondition};
pub use engine::{
    ExecutionStatus, Workflow, WorkflowEngine, WorkflowExecution, WorkflowStatus,
    CONDITIONS_NOT_MET,
};
pub use executor::{ActionExecutor, WorkflowError};
pub use store::{CreateWorkflow, UpdateWorkflow, WorkflowStore};
pub use triggers::{EventPayload, EventSource, TriggerEvent, WorkflowTrigger};
