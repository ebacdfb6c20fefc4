use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{constraint_or, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_service(conn: &Connection, service: &NewService) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO services (id, owner_id, name, price) VALUES (?1, ?2, ?3, ?4)",
        params![
            id.to_string(),
            service.owner_id.to_string(),
            service.name,
            service.price,
        ],
    )
    .map_err(|e| constraint_or(e, format!("A service named '{}' already exists", service.name)))?;
    Ok(id)
}

/// Price list of an owner, alphabetical.
pub fn list_services(conn: &Connection, owner_id: &Uuid) -> Result<Vec<Service>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, price FROM services
         WHERE owner_id = ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![owner_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
        ))
    })?;

    let mut services = Vec::new();
    for row in rows {
        let (id, owner_id, name, price) = row?;
        services.push(Service {
            id: parse_uuid(&id)?,
            owner_id: parse_uuid(&owner_id)?,
            name,
            price,
        });
    }
    Ok(services)
}

pub fn update_service(
    conn: &Connection,
    id: &Uuid,
    name: &str,
    price: f64,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE services SET name = ?1, price = ?2 WHERE id = ?3",
            params![name, price, id.to_string()],
        )
        .map_err(|e| constraint_or(e, format!("A service named '{name}' already exists")))?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Service", id));
    }
    Ok(())
}

pub fn delete_service(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM services WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Service", id));
    }
    Ok(())
}
