use serde::{Deserialize, Deserializer, Serialize};

pub mod address;
pub mod carrier;
pub mod sender;
pub mod shipment;
pub mod tracking;
pub mod user;

/// Uniform response envelope for every API operation.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Deserializes a field into `Some(inner)` whenever it appears in the
/// payload, so a `#[serde(default)]` outer `None` means "not
/// submitted" while `Some(None)` means "submitted as null". Update
/// payloads use this to tell an explicit clear apart from an omission.
pub fn tri_state<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Merge rule for tri-state fields: absent keeps the stored value,
/// null clears to the empty string, anything else replaces.
pub fn merge_tri_state(patch: Option<Option<String>>, current: String) -> String {
    match patch {
        Some(value) => value.unwrap_or_default(),
        None => current,
    }
}

/// Merge rule for required text fields: absent and blank both keep
/// the stored value.
pub fn merge_non_blank(patch: Option<String>, current: String) -> String {
    match patch {
        Some(value) if !value.is_empty() => value,
        _ => current,
    }
}

fn coerce_f64(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Accepts a number or a numeric string, coercing anything else to 0.
/// Form clients submit weight and amount as strings.
pub fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_f64(&value))
}

/// Tri-state variant of [`lenient_f64`]: `None` only when the field is
/// absent, so an explicit 0 is distinguishable from "not submitted".
pub fn tri_state_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(Some(coerce_f64(&value)))
}

/// Accepts an id as a number or a numeric string; anything else reads
/// as absent.
pub fn lenient_opt_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
