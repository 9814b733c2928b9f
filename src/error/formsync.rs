use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error as ThisError;

use super::oauth::OauthError;

#[derive(Debug, ThisError)]
pub enum FormsyncError {
    /// Provider client configuration (client-secret JSON, endpoints) is missing or unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No valid or refreshable credential; the interactive authorization flow must restart.
    #[error("Not authenticated with Google; authorize first")]
    NotAuthenticated,

    /// The provider rejected the authorization-code exchange.
    #[error("Authorization code exchange failed: {0}")]
    AuthExchange(#[source] OauthError),

    /// `forms.create` or `forms.batchUpdate` failed. When the batch step fails, `form_id`
    /// names the empty form that was created and left in place.
    #[error("Forms API request failed: {message}")]
    ProviderRequest {
        status: Option<StatusCode>,
        message: String,
        form_id: Option<String>,
    },

    /// A remote call timed out or could not connect. `form_id` is set when the batch
    /// step was the call that failed.
    #[error("Google is unavailable: {message}")]
    ProviderUnavailable {
        message: String,
        form_id: Option<String>,
    },

    /// The submitted schema is malformed; nothing was sent to the provider.
    #[error("Invalid form schema: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl FormsyncError {
    /// Classify a failed code exchange: unreachable provider vs. rejected exchange.
    pub fn from_exchange(err: OauthError) -> Self {
        if err.is_unreachable() {
            FormsyncError::ProviderUnavailable {
                message: err.to_string(),
                form_id: None,
            }
        } else {
            FormsyncError::AuthExchange(err)
        }
    }

    /// Attach the id of a form that already exists upstream to a provider failure.
    pub fn with_form_id(self, id: &str) -> Self {
        match self {
            FormsyncError::ProviderRequest {
                status, message, ..
            } => FormsyncError::ProviderRequest {
                status,
                message,
                form_id: Some(id.to_string()),
            },
            FormsyncError::ProviderUnavailable { message, .. } => {
                FormsyncError::ProviderUnavailable {
                    message,
                    form_id: Some(id.to_string()),
                }
            }
            other => other,
        }
    }
}

impl From<reqwest::Error> for FormsyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            FormsyncError::ProviderUnavailable {
                message: e.to_string(),
                form_id: None,
            }
        } else {
            FormsyncError::ProviderRequest {
                status: e.status(),
                message: e.to_string(),
                form_id: None,
            }
        }
    }
}

impl IntoResponse for FormsyncError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            FormsyncError::Configuration(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message,
                    details: None,
                },
            ),

            FormsyncError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                ApiErrorObject {
                    code: "NOT_AUTHENTICATED".to_string(),
                    message: "No valid Google credential; authorize first.".to_string(),
                    details: None,
                },
            ),

            FormsyncError::AuthExchange(err) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "AUTH_EXCHANGE_FAILED".to_string(),
                    message: format!("Authentication failed: {err}"),
                    details: None,
                },
            ),

            FormsyncError::Validation(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiErrorObject {
                    code: "VALIDATION_ERROR".to_string(),
                    message,
                    details: None,
                },
            ),

            FormsyncError::ProviderRequest {
                status,
                message,
                form_id,
            } => (
                StatusCode::BAD_GATEWAY,
                ApiErrorObject {
                    code: "PROVIDER_REQUEST_FAILED".to_string(),
                    message,
                    details: Some(json!({
                        "upstream_status": status.map(|s| s.as_u16()),
                        "form_id": form_id,
                    })),
                },
            ),

            FormsyncError::ProviderUnavailable { form_id, .. } => (
                StatusCode::GATEWAY_TIMEOUT,
                ApiErrorObject {
                    code: "PROVIDER_UNAVAILABLE".to_string(),
                    message: "Google did not respond in time.".to_string(),
                    details: form_id.map(|id| json!({ "form_id": id })),
                },
            ),

            FormsyncError::IoError(_) | FormsyncError::JsonError(_) | FormsyncError::UrlError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    details: None,
                },
            ),
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
