use rusqlite::{params, Connection};

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_app_log(conn: &Connection, entry: &AppLogEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO app_logs
         (id, owner_id, business_name, error_message, error_detail, context, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id.to_string(),
            entry.owner_id.map(|id| id.to_string()),
            entry.business_name,
            entry.error_message,
            entry.error_detail,
            entry.context,
            format_timestamp(&entry.created_at),
        ],
    )?;
    Ok(())
}

/// Most recent log entries first.
pub fn recent_app_logs(conn: &Connection, limit: u32) -> Result<Vec<AppLogEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, business_name, error_message, error_detail, context, created_at
         FROM app_logs ORDER BY created_at DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, owner_id, business_name, error_message, error_detail, context, created_at) = row?;
        entries.push(AppLogEntry {
            id: parse_uuid(&id)?,
            owner_id: owner_id.as_deref().map(parse_uuid).transpose()?,
            business_name,
            error_message,
            error_detail,
            context,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(entries)
}
