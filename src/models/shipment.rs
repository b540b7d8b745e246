use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{lenient_f64, lenient_opt_i64, tri_state, tri_state_f64};

/// Status a newly created shipment gets when the client submits none.
///
/// The conventional labels are `shipped`, `in_transit`, `delivered`
/// and `returned`, but the write path stores whatever label the client
/// sends; filtering works on exact match either way.
pub const DEFAULT_STATUS: &str = "shipped";

/// A shipment record as stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shipment {
    pub id: i64,
    pub tracking_number: String,
    pub carrier_id: i64,
    pub sender_id: i64,
    pub address_id: i64,
    pub weight: f64,
    pub amount: f64,
    pub status: String,
    pub shipping_date: NaiveDate,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// A shipment joined with the display fields of the registries it
/// references. The registry columns are nullable because the joins are
/// outer joins.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShipmentDetails {
    pub id: i64,
    pub tracking_number: String,
    pub carrier_id: i64,
    pub sender_id: i64,
    pub address_id: i64,
    pub weight: f64,
    pub amount: f64,
    pub status: String,
    pub shipping_date: NaiveDate,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub carrier_name: Option<String>,
    pub sender_name: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub recipient_address: Option<String>,
}

/// Payload for creating a shipment.
#[derive(Debug, Default, Deserialize)]
pub struct NewShipment {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub carrier_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub sender_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub address_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub shipping_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Merge-on-update payload. Weight and amount keep the stored value
/// only when the field is exactly absent, so a submitted 0 is stored
/// as 0.
#[derive(Debug, Default, Deserialize)]
pub struct ShipmentPatch {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub carrier_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub sender_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub address_id: Option<i64>,
    #[serde(default, deserialize_with = "tri_state_f64")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "tri_state_f64")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub shipping_date: Option<String>,
    #[serde(default, deserialize_with = "tri_state")]
    pub notes: Option<Option<String>>,
}

/// Listing filters. All filters are optional and AND-composed;
/// `carrier_id` and `status` accept the sentinel `all` as "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct ShipmentFilter {
    pub month: Option<String>,
    pub carrier_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ShipmentFilter {
    pub fn month_filter(&self) -> Option<&str> {
        self.month.as_deref().filter(|m| !m.is_empty())
    }

    /// Rowids start at 1, so an id that is present but not numeric
    /// matches no carrier instead of disabling the filter.
    pub fn carrier_filter(&self) -> Option<i64> {
        self.carrier_id
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "all")
            .map(|c| c.parse().unwrap_or(-1))
    }

    pub fn status_filter(&self) -> Option<&str> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "all")
    }

    pub fn search_filter(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

/// One aggregation group: a carrier within a calendar month.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CarrierMonthSummary {
    pub carrier_id: i64,
    pub carrier_name: String,
    pub month: String,
    pub total_count: i64,
    pub total_amount: f64,
    pub total_weight: f64,
}

/// Overall totals, derived by summing the emitted groups.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryTotals {
    pub total_count: i64,
    pub total_amount: f64,
    pub total_weight: f64,
}

#[derive(Debug, Serialize)]
pub struct ShipmentSummary {
    pub details: Vec<CarrierMonthSummary>,
    pub totals: SummaryTotals,
}

/// Per-month totals across all carriers.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthlySummary {
    pub month: String,
    pub total_count: i64,
    pub total_amount: f64,
}
