use crate::credentials::CredentialManager;
use crate::error::FormsyncError;
use crate::utils::logging::{body_preview, with_pretty_json_debug};
use formsync_schema::{BatchUpdateFormRequest, BatchUpdateFormResponse, Form, FormsApiErrorBody};
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::debug;
use url::Url;

const FORMS_BODY_PREVIEW_CHARS: usize = 300;

/// Hands out [`FormsClient`]s bound to a currently valid access token.
pub struct FormsClientFactory {
    credentials: Arc<CredentialManager>,
    http: reqwest::Client,
    api_url: Url,
}

impl FormsClientFactory {
    pub fn new(credentials: Arc<CredentialManager>, http: reqwest::Client, api_url: Url) -> Self {
        Self {
            credentials,
            http,
            api_url,
        }
    }

    /// Fails with `NotAuthenticated` (and no network call) when no usable credential exists.
    pub async fn authenticated(&self) -> Result<FormsClient, FormsyncError> {
        let record = self
            .credentials
            .get_valid_credentials()
            .await
            .ok_or(FormsyncError::NotAuthenticated)?;

        Ok(FormsClient {
            http: self.http.clone(),
            api_url: self.api_url.clone(),
            access_token: record.access_token,
        })
    }
}

/// Forms API v1 handle for one orchestration run.
pub struct FormsClient {
    http: reqwest::Client,
    api_url: Url,
    access_token: String,
}

impl FormsClient {
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FormsyncError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                FormsyncError::Configuration(format!(
                    "forms_api_url cannot carry a path: {}",
                    self.api_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `POST /v1/forms`. The provider only accepts `info.title` and `info.documentTitle` here.
    pub async fn create_form(&self, form: &Form) -> Result<Form, FormsyncError> {
        let url = self.endpoint(&["v1", "forms"])?;
        debug!(url = %url, "forms.create");

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(form)
            .send()
            .await?;
        let resp = ensure_success("forms.create", resp).await?;
        Ok(resp.json::<Form>().await?)
    }

    /// `POST /v1/forms/{formId}:batchUpdate`, applied atomically by the provider.
    pub async fn batch_update(
        &self,
        form_id: &str,
        body: &BatchUpdateFormRequest,
    ) -> Result<BatchUpdateFormResponse, FormsyncError> {
        let method = format!("{form_id}:batchUpdate");
        let url = self.endpoint(&["v1", "forms", &method])?;

        with_pretty_json_debug(body, |pretty| {
            debug!(form.id = %form_id, "forms.batchUpdate payload:\n{pretty}");
        });

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        let resp = ensure_success("forms.batchUpdate", resp).await?;
        Ok(resp.json::<BatchUpdateFormResponse>().await?)
    }
}

async fn ensure_success(
    call: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, FormsyncError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let bytes = resp.bytes().await.unwrap_or_default();
    let message = provider_message(status, &bytes);
    debug!(call, %status, "{message}");

    Err(FormsyncError::ProviderRequest {
        status: Some(status),
        message: format!("{call} returned {status}: {message}"),
        form_id: None,
    })
}

/// Google's `error.message` when the body is the standard envelope, else a body preview.
fn provider_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<FormsApiErrorBody>(body)
        && !envelope.error.message.is_empty()
    {
        return envelope.error.message;
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        status
            .canonical_reason()
            .unwrap_or("empty response body")
            .to_string()
    } else {
        body_preview(body, FORMS_BODY_PREVIEW_CHARS)
    }
}
