use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{CompletionState, PaymentState};

/// Literal separator used to store several tasks in one text field.
pub const TASK_SEPARATOR: &str = " + ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub client_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub task: Option<String>,
    pub completion: CompletionState,
    pub estimated_price: Option<f64>,
    pub deposit: Option<f64>,
    pub payment: PaymentState,
    pub reminder_at: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
}

impl Appointment {
    pub fn is_paid(&self) -> bool {
        self.payment.is_paid()
    }

    /// Remaining amount to collect, never negative.
    pub fn balance_due(&self) -> f64 {
        crate::ledger::balance_due(self.estimated_price, self.deposit)
    }

    /// Task names as displayed. Names containing the separator split too.
    pub fn task_names(&self) -> Vec<&str> {
        match self.task.as_deref() {
            Some(task) if !task.trim().is_empty() => {
                task.split(TASK_SEPARATOR).map(str::trim).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Fields supplied at creation. Id, completion, payment and reminder
/// flags are filled by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub owner_id: Uuid,
    pub client_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub task: Option<String>,
    pub estimated_price: Option<f64>,
}

/// Partial update. `None` leaves a field untouched; the nested options
/// allow clearing nullable columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentPatch {
    pub client_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub task: Option<Option<String>>,
    pub completion: Option<CompletionState>,
    pub estimated_price: Option<Option<f64>>,
    pub deposit: Option<Option<f64>>,
    pub payment: Option<PaymentState>,
    pub reminder_at: Option<Option<DateTime<Utc>>>,
    pub reminder_sent: Option<bool>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn reminder_sent() -> Self {
        Self {
            reminder_sent: Some(true),
            ..Self::default()
        }
    }
}
