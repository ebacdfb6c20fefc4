use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Business name recorded when no owner session is active.
pub const ANONYMOUS_BUSINESS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppLogEntry {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub business_name: String,
    pub error_message: String,
    pub error_detail: Option<String>,
    pub context: String,
    pub created_at: DateTime<Utc>,
}
