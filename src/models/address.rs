use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::tri_state;

/// A recipient address referenced by shipment records.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Address {
    pub id: i64,
    pub recipient_name: String,
    pub contact_person: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating an address. Name, phone and street address are
/// required; the contact person is optional.
#[derive(Debug, Default, Deserialize)]
pub struct NewAddress {
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<String>,
}

/// Merge-on-update payload. `contact_person` is tri-state so a caller
/// can clear it with an explicit null without losing it on omission.
#[derive(Debug, Default, Deserialize)]
pub struct AddressPatch {
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default, deserialize_with = "tri_state")]
    pub contact_person: Option<Option<String>>,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<String>,
}
