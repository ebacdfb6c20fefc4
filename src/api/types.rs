//! Shared types for the API layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core_state::CoreState;
use crate::models::User;

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Payloads shared by several endpoints
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub engine_running: bool,
}

/// Price list entry as posted.
#[derive(Debug, Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    pub description: String,
    pub amount: f64,
}

/// Reject blank text and negative or non-finite amounts before touching
/// the store.
pub(crate) fn validate_entry(text: &str, amount: f64, what: &str) -> Result<String, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(format!("{what} is required"));
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err("Amount must be a non-negative number".into());
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_need_text_and_non_negative_amount() {
        assert_eq!(validate_entry("  Corte ", 5000.0, "Name"), Ok("Corte".into()));
        assert_eq!(validate_entry(" ", 10.0, "Name"), Err("Name is required".into()));
        assert!(validate_entry("Corte", -1.0, "Name").is_err());
        assert!(validate_entry("Corte", f64::NAN, "Name").is_err());
        assert!(validate_entry("Gratis", 0.0, "Name").is_ok());
    }
}
