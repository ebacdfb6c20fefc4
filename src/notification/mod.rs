//! Reminder delivery.
//!
//! A fired reminder goes through an ordered chain of platform channels
//! (background, then foreground) and always ends in the in-app banner.
//! Platform failures are logged and masked by the banner.

pub mod banner;
pub mod channel;
pub mod composer;
pub mod dispatcher;
pub mod platform;

pub use banner::InAppBanner;
pub use channel::{BackgroundChannel, DeliveryChannel, ForegroundChannel};
pub use composer::{compose_message, compose_url};
pub use dispatcher::{DispatchOutcome, NotificationDispatcher, PermissionGate};
pub use platform::{HeadlessPlatform, NotificationPlatform};

use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::display;
use crate::models::Appointment;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(&'static str),

    #[error("Platform notification failed: {0}")]
    Platform(String),

    #[error("Invalid messaging link: {0}")]
    InvalidLink(#[from] url::ParseError),

    #[error("Notification state lock poisoned")]
    LockPoisoned,
}

/// What a platform channel shows for one reminder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub appointment_id: Uuid,
    /// `reminder-{id}`; lets the platform replace rather than stack.
    pub tag: String,
    pub title: String,
    pub body: String,
    /// Messaging link opened when the notification is clicked.
    pub open_url: String,
}

impl Notice {
    pub fn for_appointment(appointment: &Appointment, tz: Tz) -> Result<Self, NotifyError> {
        Ok(Self {
            appointment_id: appointment.id,
            tag: format!("reminder-{}", appointment.id),
            title: format!("Reminder: {}", appointment.client_name),
            body: format!(
                "The appointment is on {} at {}.",
                display::short_date(&appointment.scheduled_at, tz),
                display::time_of_day(&appointment.scheduled_at, tz),
            ),
            open_url: compose_url(appointment, tz)?.to_string(),
        })
    }
}
