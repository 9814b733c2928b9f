mod formsync;
mod oauth;

pub use formsync::{ApiErrorBody, ApiErrorObject, FormsyncError};
pub use oauth::OauthError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
