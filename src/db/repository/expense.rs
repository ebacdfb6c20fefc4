use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

/// Insert an expense stamped with the insertion time.
pub fn insert_expense(conn: &Connection, expense: &NewExpense) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO expenses (id, owner_id, description, amount, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id.to_string(),
            expense.owner_id.to_string(),
            expense.description,
            expense.amount,
            format_timestamp(&Utc::now()),
        ],
    )?;
    Ok(id)
}

/// Expenses of an owner, newest first.
pub fn list_expenses(conn: &Connection, owner_id: &Uuid) -> Result<Vec<Expense>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, description, amount, created_at FROM expenses
         WHERE owner_id = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![owner_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut expenses = Vec::new();
    for row in rows {
        let (id, owner_id, description, amount, created_at) = row?;
        expenses.push(Expense {
            id: parse_uuid(&id)?,
            owner_id: parse_uuid(&owner_id)?,
            description,
            amount,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(expenses)
}

pub fn update_expense(
    conn: &Connection,
    id: &Uuid,
    description: &str,
    amount: f64,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE expenses SET description = ?1, amount = ?2 WHERE id = ?3",
        params![description, amount, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Expense", id));
    }
    Ok(())
}

pub fn delete_expense(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM expenses WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Expense", id));
    }
    Ok(())
}
