//! Request payloads and API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `customers/create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    pub application_slug: String,
    pub unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

/// Customer record echoed by `customers/create`.
///
/// Dates are kept as the server sent them; use [`Customer::created_time`]
/// and [`Customer::updated_time`] to parse them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub unique_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Customer {
    /// Creation time, if the server sent an RFC 3339 timestamp.
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.created_at)
    }

    /// Last update time, if the server sent an RFC 3339 timestamp.
    pub fn updated_time(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.updated_at)
    }
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Body of `sessions/start`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionPayload {
    pub application_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_unique_id: Option<String>,
}

/// Response of `sessions/start`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    pub session_id: String,
}

/// Body of `sessions/set-time` and `sessions/end`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTimePayload {
    pub session_id: String,
    pub time_spent_ms: u64,
}

/// Body of `sessions/identify`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifySessionPayload {
    pub application_slug: String,
    pub session_id: String,
    pub customer_unique_id: String,
}

/// `{ "success": bool }` acknowledgement used by the session endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
}

/// Body of `usages/consume`. Absent optional fields are omitted, never
/// sent as `null`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePayload {
    pub customer_unique_id: String,
    pub feature_slug: String,
    pub application_slug: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_description: Option<String>,
}

/// Acknowledgement of `usages/consume`. The shape is defined by the server;
/// an empty body becomes `Value::Null`.
pub type UsageAck = serde_json::Value;

/// Error body returned by the API on non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
