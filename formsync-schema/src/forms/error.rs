use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Google API error envelope: `{"error": {"code", "message", "status", "details"}}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormsApiErrorBody {
    pub error: FormsApiErrorObject,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormsApiErrorObject {
    #[serde(default)]
    pub code: u16,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_google_error_envelope() {
        let body: FormsApiErrorBody = serde_json::from_value(json!({
            "error": {
                "code": 400,
                "message": "Invalid requests[0].createItem: title is required",
                "status": "INVALID_ARGUMENT"
            }
        }))
        .unwrap();

        assert_eq!(body.error.code, 400);
        assert_eq!(body.error.status.as_deref(), Some("INVALID_ARGUMENT"));
        assert!(body.error.message.contains("createItem"));
    }
}
