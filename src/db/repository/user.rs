use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use chrono::Utc;
use pbkdf2::pbkdf2_hmac;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::{constraint_or, format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub const PASSWORD_ITERATIONS: u32 = 100_000;
pub const MIN_PASSWORD_LENGTH: usize = 6;
const HASH_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;
const HASH_SCHEME: &str = "pbkdf2-sha256";

/// Create a confirmed user. Email is unique (case-insensitive).
pub fn create_user(conn: &Connection, new_user: &NewUser) -> Result<User, DatabaseError> {
    let email = new_user.email.trim().to_lowercase();
    let business_name = new_user.business_name.trim().to_string();

    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(DatabaseError::ConstraintViolation(format!("Invalid email: {email}")));
    }
    if new_user.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if business_name.is_empty() {
        return Err(DatabaseError::ConstraintViolation("Business name is required".into()));
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        business_name,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO users (id, email, business_name, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.email,
            user.business_name,
            hash_password(&new_user.password),
            format_timestamp(&user.created_at),
        ],
    )
    .map_err(|e| constraint_or(e, format!("A user with email {} already exists", user.email)))?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(user)
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, email, business_name, created_at FROM users WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, email, business_name, created_at)| {
        Ok(User {
            id: parse_uuid(&id)?,
            email,
            business_name,
            created_at: parse_timestamp(&created_at)?,
        })
    })
    .transpose()
}

/// Look up a user by email and check the password. `None` covers both
/// an unknown email and a wrong password.
pub fn verify_credentials(
    conn: &Connection,
    email: &str,
    password: &str,
) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            params![email.trim().to_lowercase()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    let Some((id, stored_hash)) = row else {
        return Ok(None);
    };
    if !verify_password(password, &stored_hash) {
        return Ok(None);
    }
    get_user(conn, &parse_uuid(&id)?)
}

pub fn update_business_name(
    conn: &Connection,
    id: &Uuid,
    business_name: &str,
) -> Result<(), DatabaseError> {
    let business_name = business_name.trim();
    if business_name.is_empty() {
        return Err(DatabaseError::ConstraintViolation("Business name is required".into()));
    }
    let changed = conn.execute(
        "UPDATE users SET business_name = ?1 WHERE id = ?2",
        params![business_name, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("User", id));
    }
    Ok(())
}

/// `pbkdf2-sha256$<iterations>$<salt>$<hash>`, base64 without padding.
fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LENGTH] = rand::random();
    let hash = derive(password, &salt, PASSWORD_ITERATIONS);
    format!(
        "{HASH_SCHEME}${PASSWORD_ITERATIONS}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let (Ok(iterations), Ok(salt), Ok(expected)) = (
        iterations.parse::<u32>(),
        STANDARD_NO_PAD.decode(salt),
        STANDARD_NO_PAD.decode(hash),
    ) else {
        return false;
    };
    let actual = derive(password, &salt, iterations);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}
