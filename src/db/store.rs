//! Shared connection handle.
//!
//! The API handlers, the reminder write-back task and the session
//! operations all go through one `Store`, so SQLite sees a single writer.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use uuid::Uuid;

use super::repository::*;
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::*;

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        tracing::info!(path = %path.display(), "Opening database");
        Ok(Self::from_connection(open_database(path)?))
    }

    /// In-memory store with the full schema (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

impl AppointmentRepository for Store {
    fn list(&self, owner_id: &Uuid) -> Result<Vec<Appointment>, DatabaseError> {
        self.with_conn(|conn| list_appointments(conn, owner_id))
    }

    fn get(&self, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
        self.with_conn(|conn| get_appointment(conn, id))
    }

    fn create(&self, appointment: &NewAppointment) -> Result<Uuid, DatabaseError> {
        self.with_conn(|conn| insert_appointment(conn, appointment))
    }

    fn update(&self, id: &Uuid, patch: &AppointmentPatch) -> Result<(), DatabaseError> {
        self.with_conn(|conn| update_appointment(conn, id, patch))
    }

    fn delete(&self, id: &Uuid) -> Result<(), DatabaseError> {
        self.with_conn(|conn| delete_appointment(conn, id))
    }
}
