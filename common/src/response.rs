//! API response wrapper types.
//!
//! Provides a unified response format for all API endpoints: the payload is
//! flattened into the envelope next to `success` and `timestamp`, so a
//! successful response reads `{ "success": true, ...payload, "timestamp": … }`
//! and a failed one `{ "success": false, "error": …, "timestamp": … }`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard API response envelope.
///
/// All API endpoints return responses in this format for consistency.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,

    /// Response payload, flattened into the envelope (present on success).
    #[serde(flatten)]
    pub data: Option<T>,

    /// Human-readable error message (present on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Response timestamp (ISO-8601, UTC).
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response with the given payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    /// Creates an error response with a message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    /// Creates a success response without a payload.
    pub fn success() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        message: String,
    }

    #[test]
    fn test_ok_flattens_payload() {
        let resp = ApiResponse::ok(Payload {
            message: "Hello, World!".into(),
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Hello, World!");
        assert!(json.get("error").is_none());
        assert!(json.get("timestamp").is_some());
        // The payload is spread into the envelope, not nested under "data".
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_err_carries_message() {
        let resp = ApiResponse::err("boom");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
    }
}
