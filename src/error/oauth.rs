use super::IsRetryable;
use crate::utils::logging::body_preview;
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use thiserror::Error as ThisError;

/// Failures talking to the Google token endpoint.
#[derive(Debug, ThisError)]
pub enum OauthError {
    #[error("OAuth flow error: {message}")]
    Flow { code: String, message: String },

    #[error("granted scopes are missing: {}", .missing.join(", "))]
    InsufficientScope { missing: Vec<String> },

    #[error("OAuth2 request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OAuth2 server response error: {error}{}", describe(.description))]
    ServerResponse {
        error: String,
        description: Option<String>,
    },

    #[error("OAuth2 token endpoint parse error: {message}. Body: {body}")]
    Parse { message: String, body: String },

    #[error("OAuth2 unexpected error: {message}")]
    Other { message: String },
}

fn describe(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

impl OauthError {
    /// Timeouts and connection failures: the provider never answered.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, OauthError::Request(e) if e.is_timeout() || e.is_connect())
    }
}

impl IsRetryable for OauthError {
    fn is_retryable(&self) -> bool {
        match self {
            OauthError::Request(_) => true,
            OauthError::ServerResponse { error, .. } => {
                matches!(error.as_str(), "server_error" | "temporarily_unavailable")
            }
            _ => false,
        }
    }
}

type PkgsRequestTokenError = RequestTokenError<
    HttpClientError<ReqwestClientError>,
    StandardErrorResponse<BasicErrorResponseType>,
>;

impl From<PkgsRequestTokenError> for OauthError {
    fn from(e: PkgsRequestTokenError) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => OauthError::ServerResponse {
                error: err.error().to_string(),
                description: err.error_description().cloned(),
            },
            RequestTokenError::Request(wrapper) => match wrapper {
                oauth2::HttpClientError::Reqwest(real_err) => OauthError::Request(*real_err),
                other => OauthError::Other {
                    message: format!("HttpClientError: {:?}", other),
                },
            },
            RequestTokenError::Parse(parse_err, body) => {
                OauthError::Parse {
                    message: parse_err.to_string(),
                    body: body_preview(&body, 100),
                }
            }
            RequestTokenError::Other(s) => OauthError::Other { message: s },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_rejections_are_not_retryable() {
        let err = OauthError::ServerResponse {
            error: "invalid_grant".to_string(),
            description: Some("Token has been expired or revoked.".to_string()),
        };
        assert!(!err.is_retryable());
        assert!(!err.is_unreachable());
        assert_eq!(
            err.to_string(),
            "OAuth2 server response error: invalid_grant (Token has been expired or revoked.)"
        );
    }

    #[test]
    fn transient_server_responses_are_retryable() {
        for error in ["server_error", "temporarily_unavailable"] {
            let err = OauthError::ServerResponse {
                error: error.to_string(),
                description: None,
            };
            assert!(err.is_retryable(), "{error} should be retryable");
        }
        let err = OauthError::Parse {
            message: "expected value".to_string(),
            body: "<html>".to_string(),
        };
        assert!(!err.is_retryable());
    }
}
