use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::tri_state;

/// A carrier company referenced by shipment records.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Carrier {
    pub id: i64,
    pub name: String,
    pub contact_person: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a carrier. Only the name is required.
#[derive(Debug, Default, Deserialize)]
pub struct NewCarrier {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Merge-on-update payload: omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct CarrierPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "tri_state")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub address: Option<Option<String>>,
}
