use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Shared record types for the association management platform.
// Actor identifiers (created_by, assigned_to, user_id) are opaque strings
// issued by the external auth provider; record identifiers are UUIDs.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: Uuid,
    pub full_name: String,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub family_size: Option<i32>,
    pub status: String, // AKTIF, PASIF, BEKLEMEDE
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub donor_name: String,
    pub donor_email: Option<String>,
    pub donor_phone: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub donation_type: String, // cash, in_kind, zakat, sadaqah
    pub status: String,        // pending, completed, cancelled
    pub received_at: DateTime<Utc>,
    pub receipt_sent: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AidApplication {
    pub id: Uuid,
    pub beneficiary_id: Uuid,
    pub aid_type: String, // financial, food, clothing, education, health
    pub stage: String,    // draft, under_review, approved, rejected, delivered
    pub priority: String,
    pub amount_requested: Option<Decimal>,
    pub description: Option<String>,
    /// Raw application form payload as submitted
    pub form_data: Option<serde_json::Value>,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: String, // low, normal, high, urgent
    pub status: String,   // pending, in_progress, completed, cancelled
    pub due_date: Option<NaiveDate>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub location: Option<String>,
    pub organizer: String,
    pub participants: Vec<String>,
    pub status: String, // scheduled, completed, cancelled
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
