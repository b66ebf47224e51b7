// Response envelope shared by every endpoint and by the client

use axum::{http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{success, data|error, message}` wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
            error: None,
            code: None,
            details: None,
        }
    }

    pub fn failure(error: impl Into<String>, code: &str, details: Option<Value>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
            code: Some(code.to_string()),
            details,
        }
    }
}

pub type Envelope<T> = (StatusCode, Json<ApiResponse<T>>);

/// 200 with a payload
pub fn ok<T: Serialize>(data: T, message: &str) -> Envelope<T> {
    (StatusCode::OK, Json(ApiResponse::success(Some(data), message)))
}

/// 201 with the created payload
pub fn created<T: Serialize>(data: T, message: &str) -> Envelope<T> {
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(data), message)),
    )
}

/// 200 without a payload
pub fn message(message: &str) -> Envelope<Value> {
    (StatusCode::OK, Json(ApiResponse::success(None, message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_omits_error_fields() {
        let (status, Json(body)) = ok(json!({"id": 1}), "Done");
        assert_eq!(status, StatusCode::OK);
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"id": 1}, "message": "Done"}));
    }

    #[test]
    fn message_envelope_has_no_data() {
        let (_, Json(body)) = message("Logged out");
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, json!({"success": true, "message": "Logged out"}));
    }

    #[test]
    fn envelope_round_trips_for_clients() {
        let raw = r#"{"success":false,"error":"Invalid credentials","code":"AUTHENTICATION_ERROR"}"#;
        let parsed: ApiResponse<Value> = serde_json::from_str(raw).unwrap();
        assert!(!parsed.success);
        assert!(parsed.data.is_none());
        assert_eq!(parsed.error.as_deref(), Some("Invalid credentials"));
    }

    fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> ApiResponse<T> {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn payloads_without_default_decode() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Token {
            value: String,
        }

        let present: ApiResponse<Token> = decode(r#"{"success":true,"data":{"value":"x"}}"#);
        assert_eq!(present.data, Some(Token { value: "x".to_string() }));

        let absent: ApiResponse<Token> = decode(r#"{"success":true,"message":"ok"}"#);
        assert_eq!(absent.data, None);
    }
}
