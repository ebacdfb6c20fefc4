use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{CompletionState, PaymentState};
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, owner_id, client_name, scheduled_at, task, completed,
     estimated_price, deposit, paid, reminder_at, reminder_sent";

/// Owner-scoped appointment storage as seen by the reminder engine and
/// the appointment operations. Every call may fail; callers decide
/// whether a failure is surfaced or only logged.
pub trait AppointmentRepository: Send + Sync {
    /// All appointments of an owner, ordered by scheduled time.
    fn list(&self, owner_id: &Uuid) -> Result<Vec<Appointment>, DatabaseError>;

    fn get(&self, id: &Uuid) -> Result<Option<Appointment>, DatabaseError>;

    /// Insert and return the identifier assigned by the store.
    fn create(&self, appointment: &NewAppointment) -> Result<Uuid, DatabaseError>;

    fn update(&self, id: &Uuid, patch: &AppointmentPatch) -> Result<(), DatabaseError>;

    fn delete(&self, id: &Uuid) -> Result<(), DatabaseError>;
}

pub fn insert_appointment(
    conn: &Connection,
    appointment: &NewAppointment,
) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO appointments
         (id, owner_id, client_name, scheduled_at, task, completed,
          estimated_price, deposit, paid, reminder_at, reminder_sent)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, NULL, 0, NULL, 0)",
        params![
            id.to_string(),
            appointment.owner_id.to_string(),
            appointment.client_name,
            format_timestamp(&appointment.scheduled_at),
            appointment.task,
            appointment.estimated_price,
        ],
    )?;
    Ok(id)
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt
        .query_map(params![id.to_string()], appointment_row_from_rusqlite)?
        .next()
        .transpose()?;
    row.map(appointment_from_row).transpose()
}

pub fn list_appointments(
    conn: &Connection,
    owner_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE owner_id = ?1 ORDER BY scheduled_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner_id.to_string()], appointment_row_from_rusqlite)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

/// Apply a partial update. Fails with `NotFound` when no row matches.
pub fn update_appointment(
    conn: &Connection,
    id: &Uuid,
    patch: &AppointmentPatch,
) -> Result<(), DatabaseError> {
    let mut assignments: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(name) = &patch.client_name {
        assignments.push("client_name");
        values.push(Value::Text(name.clone()));
    }
    if let Some(at) = &patch.scheduled_at {
        assignments.push("scheduled_at");
        values.push(Value::Text(format_timestamp(at)));
    }
    if let Some(task) = &patch.task {
        assignments.push("task");
        values.push(task.clone().map_or(Value::Null, Value::Text));
    }
    if let Some(completion) = patch.completion {
        assignments.push("completed");
        values.push(completion.to_column().map_or(Value::Null, Value::Integer));
    }
    if let Some(price) = patch.estimated_price {
        assignments.push("estimated_price");
        values.push(price.map_or(Value::Null, Value::Real));
    }
    if let Some(deposit) = patch.deposit {
        assignments.push("deposit");
        values.push(deposit.map_or(Value::Null, Value::Real));
    }
    if let Some(payment) = patch.payment {
        assignments.push("paid");
        values.push(Value::Integer(i64::from(payment.is_paid())));
    }
    if let Some(reminder_at) = &patch.reminder_at {
        assignments.push("reminder_at");
        values.push(reminder_at.as_ref().map_or(Value::Null, |at| Value::Text(format_timestamp(at))));
    }
    if let Some(sent) = patch.reminder_sent {
        assignments.push("reminder_sent");
        values.push(Value::Integer(i64::from(sent)));
    }

    if assignments.is_empty() {
        return match get_appointment(conn, id)? {
            Some(_) => Ok(()),
            None => Err(DatabaseError::not_found("Appointment", id)),
        };
    }

    let set_clause = assignments
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    values.push(Value::Text(id.to_string()));
    let sql = format!(
        "UPDATE appointments SET {set_clause} WHERE id = ?{}",
        values.len()
    );

    let changed = conn.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

pub fn delete_appointment(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM appointments WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: String,
    owner_id: String,
    client_name: String,
    scheduled_at: String,
    task: Option<String>,
    completed: Option<i64>,
    estimated_price: Option<f64>,
    deposit: Option<f64>,
    paid: Option<i64>,
    reminder_at: Option<String>,
    reminder_sent: Option<i64>,
}

fn appointment_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        client_name: row.get(2)?,
        scheduled_at: row.get(3)?,
        task: row.get(4)?,
        completed: row.get(5)?,
        estimated_price: row.get(6)?,
        deposit: row.get(7)?,
        paid: row.get(8)?,
        reminder_at: row.get(9)?,
        reminder_sent: row.get(10)?,
    })
}

/// Missing flags read as false and an unreadable reminder time reads as
/// "no reminder"; the scheduled time is mandatory.
fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let reminder_at = match row.reminder_at.as_deref() {
        Some(raw) => match parse_timestamp(raw) {
            Ok(at) => Some(at),
            Err(e) => {
                tracing::warn!(appointment_id = %row.id, error = %e, "Ignoring unreadable reminder time");
                None
            }
        },
        None => None,
    };

    Ok(Appointment {
        id: parse_uuid(&row.id)?,
        owner_id: parse_uuid(&row.owner_id)?,
        client_name: row.client_name,
        scheduled_at: parse_timestamp(&row.scheduled_at)?,
        task: row.task,
        completion: CompletionState::from_column(row.completed),
        estimated_price: row.estimated_price,
        deposit: row.deposit,
        payment: PaymentState::from_flag(row.paid.unwrap_or(0) != 0),
        reminder_at,
        reminder_sent: row.reminder_sent.unwrap_or(0) != 0,
    })
}
