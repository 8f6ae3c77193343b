pub mod audit;
pub mod bulk;
pub mod records;

pub use audit::{AuditAction, AuditEntryBuilder, AuditService};
pub use bulk::{BulkAction, BulkOperationsService, BulkStatus};
pub use records::{EntityType, InMemoryRecords, RecordApi};
