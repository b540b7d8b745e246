use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::tracking::{Trace, TrackingInfo},
};

#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    #[serde(default)]
    carrier_name: Option<String>,
    #[serde(default)]
    tracks: Vec<UpstreamTrack>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamTrack {
    #[serde(default)]
    time: String,
    #[serde(default)]
    context: String,
}

/// Queries the external parcel tracking API and derives a display
/// status from the trace log.
#[derive(Clone)]
pub struct TrackingService {
    client: reqwest::Client,
    base_url: String,
}

impl TrackingService {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Look up the trace log for a tracking number. A slow upstream
    /// stalls only this request.
    pub async fn query_tracking(&self, tracking_number: &str) -> Result<TrackingInfo> {
        if tracking_number.is_empty() {
            return Err(AppError::Validation(
                "please provide a tracking number".into(),
            ));
        }

        let url = format!("{}/{tracking_number}", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("tracking lookup failed: {e}")))?;

        let upstream: UpstreamResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("tracking lookup returned invalid data: {e}")))?;

        if upstream.tracks.is_empty() {
            let message = upstream
                .message
                .or(upstream.error)
                .unwrap_or_else(|| "no tracking information available".to_string());
            return Err(AppError::NotFound(message));
        }

        let status = status_from_latest_trace(&upstream.tracks[0].context);

        Ok(TrackingInfo {
            tracking_number: tracking_number.to_string(),
            carrier: upstream
                .carrier_name
                .unwrap_or_else(|| "unknown".to_string()),
            status: status.to_string(),
            traces: upstream
                .tracks
                .into_iter()
                .map(|t| Trace {
                    time: t.time,
                    desc: t.context,
                })
                .collect(),
            update_time: Utc::now(),
        })
    }
}

/// Derive a parcel status from the most recent trace description.
///
/// Matching is case-insensitive and the first matching keyword class
/// wins, in this fixed priority order. Descriptions with no known
/// keyword read as still in transit.
pub fn status_from_latest_trace(latest: &str) -> &'static str {
    const CLASSES: [(&[&str], &str); 6] = [
        (&["已签收", "代签"], "signed"),
        (&["派送", "投递"], "delivering"),
        (&["揽收", "揽件"], "picked_up"),
        (&["运输", "中转"], "in_transit"),
        (&["退回", "退"], "returned"),
        (&["异常", "问题"], "exception"),
    ];

    let desc = latest.to_lowercase();
    for (keywords, status) in CLASSES {
        if keywords.iter().any(|keyword| desc.contains(keyword)) {
            return status;
        }
    }

    "in_transit"
}
