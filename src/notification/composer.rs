//! Outbound WhatsApp message for a client.

use chrono_tz::Tz;
use url::Url;

use super::NotifyError;
use crate::display;
use crate::models::Appointment;

const MESSAGING_BASE: &str = "https://wa.me/";

pub fn compose_message(appointment: &Appointment, tz: Tz) -> String {
    format!(
        "Hi {}! This is a reminder of your appointment on {} at {}. Please confirm your attendance. Thank you!",
        appointment.client_name,
        display::long_date(&appointment.scheduled_at, tz),
        display::time_of_day(&appointment.scheduled_at, tz),
    )
}

/// `https://wa.me/?text=...` with the message form-encoded. No recipient
/// number is stored, so the user picks the chat.
pub fn compose_url(appointment: &Appointment, tz: Tz) -> Result<Url, NotifyError> {
    let message = compose_message(appointment, tz);
    Ok(Url::parse_with_params(MESSAGING_BASE, &[("text", message)])?)
}
