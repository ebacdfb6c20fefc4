//! Appointment operations for the signed-in owner.
//!
//! Every write goes straight to the store, then the owner's book is
//! reloaded in full. Nothing is mutated optimistically: a failed write
//! leaves the book as it was, is recorded in the application log and is
//! returned to the caller with the store's message.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::core_state::{CoreError, CoreState};
use crate::db::{self, AppointmentRepository, DatabaseError, Store};
use crate::display;
use crate::form::{AppointmentForm, FormInput};
use crate::ledger::{self, EarningsSummary};
use crate::models::enums::{CompletionState, PaymentState};
use crate::models::{Appointment, AppointmentPatch};

// ─── Reads ────────────────────────────────────────────────────────────────────

/// Unpaid appointments in scheduled order.
pub fn list_upcoming(state: &CoreState) -> Result<Vec<Appointment>, CoreError> {
    state.book()?.upcoming()
}

/// A list row: the appointment plus its labels in the business zone.
#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    #[serde(flatten)]
    pub appointment: Appointment,
    /// `Today`, `Tomorrow` or the weekday.
    pub day_label: String,
    pub date: String,
    pub time: String,
    pub price_label: Option<String>,
    pub balance_label: String,
}

impl ListEntry {
    pub fn new(appointment: Appointment, now: &DateTime<Utc>, tz: Tz) -> Self {
        let at = appointment.scheduled_at;
        Self {
            day_label: display::relative_day_label(&at, now, tz),
            date: display::short_date(&at, tz),
            time: display::time_of_day(&at, tz),
            price_label: appointment.estimated_price.map(ledger::format_price),
            balance_label: ledger::format_price(appointment.balance_due()),
            appointment,
        }
    }
}

pub fn list_entries(state: &CoreState) -> Result<Vec<ListEntry>, CoreError> {
    let now = state.now();
    let tz = state.timezone();
    Ok(list_upcoming(state)?
        .into_iter()
        .map(|appointment| ListEntry::new(appointment, &now, tz))
        .collect())
}

/// An appointment of the signed-in owner.
pub fn find_owned(state: &CoreState, id: &Uuid) -> Result<Appointment, CoreError> {
    state
        .book()?
        .find(id)?
        .ok_or_else(|| DatabaseError::not_found("Appointment", id).into())
}

/// Form pre-filled for editing.
pub fn edit_form(state: &CoreState, id: &Uuid) -> Result<AppointmentForm, CoreError> {
    let appointment = find_owned(state, id)?;
    Ok(AppointmentForm::for_edit(&appointment, state.timezone()))
}

// ─── Form submissions ─────────────────────────────────────────────────────────

/// Create from a posted form. `Ok(None)` when the form is incomplete;
/// nothing is written in that case.
pub fn create_from_form(state: &CoreState, input: FormInput) -> Result<Option<Appointment>, CoreError> {
    let user = state.active_user()?;
    let services = state.store().with_conn(|conn| db::list_services(conn, &user.id))?;

    let mut form = input.into_form(&services);
    let Some(draft) = form.submit(state.timezone()) else {
        tracing::debug!("Incomplete appointment form ignored");
        return Ok(None);
    };

    let new_appointment = draft.into_new(user.id);
    let id = write(state, "appointments.create", "Error creating appointment", |store| {
        store.create(&new_appointment)
    })?;
    tracing::info!(appointment_id = %id, "Appointment created");
    Ok(Some(find_owned(state, &id)?))
}

/// Resubmit in edit mode. The form starts from the stored appointment and
/// the posted fields are applied over it.
pub fn edit_from_form(
    state: &CoreState,
    id: &Uuid,
    input: FormInput,
) -> Result<Option<Appointment>, CoreError> {
    let user = state.active_user()?;
    let existing = find_owned(state, id)?;
    let services = state.store().with_conn(|conn| db::list_services(conn, &user.id))?;

    let mut form = AppointmentForm::for_edit(&existing, state.timezone());
    input.apply(&mut form, &services);
    let Some(draft) = form.submit(state.timezone()) else {
        return Ok(None);
    };

    let patch = draft.into_patch();
    write(state, "appointments.update", "Error updating appointment", |store| {
        store.update(id, &patch)
    })?;
    Ok(Some(find_owned(state, id)?))
}

pub fn delete(state: &CoreState, id: &Uuid) -> Result<(), CoreError> {
    find_owned(state, id)?;
    write(state, "appointments.delete", "Error deleting appointment", |store| {
        store.delete(id)
    })?;
    tracing::info!(appointment_id = %id, "Appointment deleted");
    Ok(())
}

// ─── Status transitions ───────────────────────────────────────────────────────

/// User actions on the completion and payment flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Complete,
    NotCompleted,
    UndoCompletion,
    Charge,
    UndoCharge,
}

impl StatusAction {
    /// Patch for this action from the current state, or why it is refused.
    ///
    /// Completion: unset or not-completed may be marked either way;
    /// completed may only be undone to unset, and not while paid.
    /// Payment: charging needs a completed appointment.
    pub fn patch_for(self, appointment: &Appointment) -> Result<AppointmentPatch, CoreError> {
        use CompletionState::*;

        let refuse = |why: &str| -> Result<AppointmentPatch, CoreError> {
            Err(CoreError::InvalidTransition(format!(
                "{why} (completion: {}, payment: {})",
                appointment.completion.as_str(),
                appointment.payment.as_str()
            )))
        };

        let patch = match self {
            Self::Complete | Self::NotCompleted => {
                if appointment.completion == Completed {
                    return refuse("Undo the completion first");
                }
                let target = if self == Self::Complete { Completed } else { NotCompleted };
                AppointmentPatch {
                    completion: Some(target),
                    ..AppointmentPatch::default()
                }
            }
            Self::UndoCompletion => {
                if appointment.completion != Completed {
                    return refuse("Only a completed appointment can be undone");
                }
                if appointment.is_paid() {
                    return refuse("Undo the charge first");
                }
                AppointmentPatch {
                    completion: Some(Unset),
                    ..AppointmentPatch::default()
                }
            }
            Self::Charge => {
                if appointment.completion != Completed {
                    return refuse("Only a completed appointment can be charged");
                }
                if appointment.is_paid() {
                    return refuse("Already charged");
                }
                AppointmentPatch {
                    payment: Some(PaymentState::Paid),
                    ..AppointmentPatch::default()
                }
            }
            Self::UndoCharge => {
                if !appointment.is_paid() {
                    return refuse("Not charged");
                }
                AppointmentPatch {
                    payment: Some(PaymentState::Unpaid),
                    ..AppointmentPatch::default()
                }
            }
        };
        Ok(patch)
    }
}

pub fn apply_status(state: &CoreState, id: &Uuid, action: StatusAction) -> Result<Appointment, CoreError> {
    let appointment = find_owned(state, id)?;
    let patch = action.patch_for(&appointment)?;
    write(state, "appointments.status", "Error updating appointment status", |store| {
        store.update(id, &patch)
    })?;
    tracing::info!(appointment_id = %id, ?action, "Appointment status changed");
    find_owned(state, id)
}

// ─── Field edits ──────────────────────────────────────────────────────────────

/// Single-field edits from the appointment list, posted as e.g.
/// `{"deposit": 30}` or `{"reminder": null}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEdit {
    Price(f64),
    Deposit(Option<f64>),
    Task(String),
    Reschedule(DateTime<Utc>),
    Reminder(Option<DateTime<Utc>>),
    /// Reminder picked as local wall-clock date and `HH:MM` time.
    ReminderLocal { date: String, time: String },
}

impl FieldEdit {
    pub fn into_patch(self, tz: Tz) -> Result<AppointmentPatch, CoreError> {
        let invalid = |detail: String| CoreError::Database(DatabaseError::ConstraintViolation(detail));
        let non_negative = |amount: f64, what: &str| {
            if amount.is_finite() && amount >= 0.0 {
                Ok(amount)
            } else {
                Err(invalid(format!("{what} must be a non-negative amount")))
            }
        };

        let patch = match self {
            Self::Price(price) => AppointmentPatch {
                estimated_price: Some(Some(non_negative(price, "Price")?)),
                ..AppointmentPatch::default()
            },
            Self::Deposit(deposit) => AppointmentPatch {
                deposit: Some(deposit.map(|d| non_negative(d, "Deposit")).transpose()?),
                ..AppointmentPatch::default()
            },
            Self::Task(task) => {
                let task = task.trim().to_string();
                AppointmentPatch {
                    task: Some((!task.is_empty()).then_some(task)),
                    ..AppointmentPatch::default()
                }
            }
            Self::Reschedule(at) => AppointmentPatch {
                scheduled_at: Some(at),
                ..AppointmentPatch::default()
            },
            // The sent flag is left alone: a reminder already delivered
            // stays delivered even if its time moves.
            Self::Reminder(at) => AppointmentPatch {
                reminder_at: Some(at),
                ..AppointmentPatch::default()
            },
            Self::ReminderLocal { date, time } => {
                let at = display::parse_local(&date, &time, tz)
                    .ok_or_else(|| invalid(format!("No such local time: {date} {time}")))?;
                AppointmentPatch {
                    reminder_at: Some(Some(at)),
                    ..AppointmentPatch::default()
                }
            }
        };
        Ok(patch)
    }
}

pub fn edit_field(state: &CoreState, id: &Uuid, edit: FieldEdit) -> Result<Appointment, CoreError> {
    find_owned(state, id)?;
    let schedules_reminder = matches!(edit, FieldEdit::Reminder(Some(_)) | FieldEdit::ReminderLocal { .. });
    let patch = edit.into_patch(state.timezone())?;

    write(state, "appointments.edit", "Error updating appointment", |store| {
        store.update(id, &patch)
    })?;

    if schedules_reminder {
        state.dispatcher()?.prepare_for_reminder();
    }
    find_owned(state, id)
}

// ─── Messaging & history ──────────────────────────────────────────────────────

/// Messaging link for the client. Also dismisses the banner when it is
/// showing this appointment.
pub fn compose(state: &CoreState, id: &Uuid) -> Result<Url, CoreError> {
    let appointment = find_owned(state, id)?;
    Ok(state.dispatcher()?.open_composer(&appointment)?)
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    #[serde(flatten)]
    pub summary: EarningsSummary,
    pub paid_history: Vec<Appointment>,
}

pub fn statistics(state: &CoreState) -> Result<Statistics, CoreError> {
    let user = state.active_user()?;
    let appointments = state.book()?.snapshot()?;
    let expenses = state.store().with_conn(|conn| db::list_expenses(conn, &user.id))?;
    Ok(Statistics {
        summary: ledger::summarize(&appointments, &expenses),
        paid_history: ledger::paid_history(&appointments),
    })
}

// ─── Internals ────────────────────────────────────────────────────────────────

/// Run a store write; on success reload the owner's book, on failure
/// record it and hand it back.
fn write<T>(
    state: &CoreState,
    context: &str,
    message: &str,
    op: impl FnOnce(&Store) -> Result<T, DatabaseError>,
) -> Result<T, CoreError> {
    let book = state.book()?;
    match op(state.store()) {
        Ok(value) => {
            book.reload(state.store())?;
            Ok(value)
        }
        Err(e) => {
            state.report_error(context, message, &e);
            Err(e.into())
        }
    }
}
