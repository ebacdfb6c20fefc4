use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Price-list item. `name` is unique per owner and is the lookup key
/// used by the appointment form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub owner_id: Uuid,
    pub name: String,
    pub price: f64,
}
