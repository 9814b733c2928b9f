use crate::config::{FORMSYNC_USER_AGENT, GoogleResolvedConfig};
use crate::credentials::CredentialManager;
use crate::error::FormsyncError;
use crate::forms::{FormCreationResult, FormCreator, FormsClientFactory};
use formsync_schema::AbstractSchema;
use oauth2::CsrfToken;
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use std::sync::Arc;
use tracing::info;
use url::Url;

/// The core components, constructed once by the entry point and shared by handle.
#[derive(Clone)]
pub struct Services {
    pub google_cfg: Arc<GoogleResolvedConfig>,
    pub credentials: Arc<CredentialManager>,
    pub forms: Arc<FormCreator>,
}

impl Services {
    pub fn build(cfg: &GoogleResolvedConfig) -> Result<Self, FormsyncError> {
        let google_cfg = Arc::new(cfg.clone());
        let http = build_client(&google_cfg)?;

        let credentials = Arc::new(CredentialManager::new(google_cfg.clone(), http.clone()));
        let factory =
            FormsClientFactory::new(credentials.clone(), http, google_cfg.forms_api_url.clone());
        let forms = Arc::new(FormCreator::new(factory, google_cfg.edit_url_base.clone()));

        info!(
            client_secret_path = %google_cfg.client_secret_path.display(),
            token_path = %google_cfg.token_path.display(),
            redirect_url = %google_cfg.redirect_url,
            forms_api_url = %google_cfg.forms_api_url,
            proxy = %google_cfg.proxy.as_ref().map_or("<none>", Url::as_str),
            enable_multiplexing = google_cfg.enable_multiplexing,
            "Google services ready"
        );

        Ok(Self {
            google_cfg,
            credentials,
            forms,
        })
    }

    /// Consent URL for `redirect_uri`, and the CSRF state to verify on callback.
    pub async fn get_authorization_url(
        &self,
        redirect_uri: &Url,
    ) -> Result<(Url, CsrfToken), FormsyncError> {
        self.credentials.build_authorization_url(redirect_uri).await
    }

    pub async fn complete_authorization(
        &self,
        code: &str,
        redirect_uri: &Url,
    ) -> Result<(), FormsyncError> {
        self.credentials.exchange_code(code, redirect_uri).await?;
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated().await
    }

    pub async fn create_provider_form(
        &self,
        schema: &AbstractSchema,
    ) -> Result<FormCreationResult, FormsyncError> {
        self.forms.create_provider_form(schema).await
    }
}

fn build_client(cfg: &GoogleResolvedConfig) -> Result<reqwest::Client, FormsyncError> {
    let mut headers = HeaderMap::new();

    let mut builder = reqwest::Client::builder()
        .user_agent(FORMSYNC_USER_AGENT)
        // oauth2 requires redirects to be disabled on the token client.
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(cfg.connect_timeout)
        .timeout(cfg.request_timeout);

    if let Some(proxy_url) = cfg.proxy.as_ref() {
        let proxy = reqwest::Proxy::all(proxy_url.as_str())
            .map_err(|e| FormsyncError::Configuration(format!("invalid proxy url: {e}")))?;
        builder = builder.proxy(proxy);
    }

    if cfg.enable_multiplexing {
        builder = builder.http2_adaptive_window(true);
    } else {
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        builder = builder.http1_only();
    }

    builder
        .default_headers(headers)
        .build()
        .map_err(|e| FormsyncError::Configuration(format!("failed to build http client: {e}")))
}
