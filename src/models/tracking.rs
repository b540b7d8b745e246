use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single waypoint in a parcel's journey.
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub time: String,
    pub desc: String,
}

/// Result of an external tracking lookup.
#[derive(Debug, Serialize)]
pub struct TrackingInfo {
    pub tracking_number: String,
    pub carrier: String,
    pub status: String,
    pub traces: Vec<Trace>,
    pub update_time: DateTime<Utc>,
}
