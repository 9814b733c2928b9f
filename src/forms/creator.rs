use super::client::FormsClientFactory;
use super::request_builder::{build_requests, validate_schema};
use crate::error::FormsyncError;
use formsync_schema::{AbstractSchema, BatchUpdateFormRequest, Form};
use serde::Serialize;
use tracing::{error, info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormCreationResult {
    pub form_id: String,
    /// Public fill link.
    pub responder_uri: String,
    /// Editor link derived from `form_id`.
    pub edit_uri: String,
}

/// Runs the two-phase creation protocol: empty form first, then one batch with the
/// description and every item.
pub struct FormCreator {
    factory: FormsClientFactory,
    edit_url_base: Url,
}

impl FormCreator {
    pub fn new(factory: FormsClientFactory, edit_url_base: Url) -> Self {
        Self {
            factory,
            edit_url_base,
        }
    }

    pub async fn create_provider_form(
        &self,
        schema: &AbstractSchema,
    ) -> Result<FormCreationResult, FormsyncError> {
        validate_schema(schema)?;
        let client = self.factory.authenticated().await?;

        let created = client.create_form(&Form::for_create(&schema.title)).await?;
        if created.form_id.is_empty() {
            return Err(FormsyncError::ProviderRequest {
                status: None,
                message: "forms.create response carried no formId".to_string(),
                form_id: None,
            });
        }
        let form_id = created.form_id;
        info!(form.id = %form_id, title = %schema.title, "form created");

        let requests = build_requests(schema);
        if !requests.is_empty() {
            let item_count = requests.len();
            // No rollback: a failed batch leaves the empty form in place and names it in the error.
            client
                .batch_update(&form_id, &BatchUpdateFormRequest::new(requests))
                .await
                .map_err(|e| {
                    error!(
                        form.id = %form_id,
                        error = %e,
                        "batch update failed; empty form left in place"
                    );
                    e.with_form_id(&form_id)
                })?;
            info!(form.id = %form_id, item_count, "form content applied");
        }

        let responder_uri = match created.responder_uri.filter(|uri| !uri.trim().is_empty()) {
            Some(uri) => uri,
            None => {
                warn!(form.id = %form_id, "create response lacked responderUri; using viewform link");
                self.form_link(&form_id, "viewform")
            }
        };

        Ok(FormCreationResult {
            edit_uri: self.form_link(&form_id, "edit"),
            form_id,
            responder_uri,
        })
    }

    fn form_link(&self, form_id: &str, action: &str) -> String {
        let base = self.edit_url_base.as_str().trim_end_matches('/');
        format!("{base}/{form_id}/{action}")
    }
}
