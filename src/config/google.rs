use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Scopes every stored credential must carry: edit form bodies, and file-scoped Drive access
/// for forms the app itself created.
pub const REQUIRED_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/forms.body",
    "https://www.googleapis.com/auth/drive.file",
];

pub const FORMSYNC_USER_AGENT: &str = concat!("formsync/", env!("CARGO_PKG_VERSION"));

/// Google OAuth + Forms API configuration managed by Figment.
///
/// OAuth client id/secret are not configured here: they come from the client-secret JSON
/// downloaded from the Cloud console (`client_secret_path`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleConfig {
    /// Path of the OAuth client-secret JSON (`web` or `installed` application).
    /// TOML: `google.client_secret_path`. Default: `credentials.json`.
    #[serde(default = "default_client_secret_path")]
    pub client_secret_path: PathBuf,

    /// Path of the persisted token record.
    /// TOML: `google.token_path`. Default: `token.json`.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// OAuth redirect target; must match one registered on the OAuth client.
    /// TOML: `google.redirect_url`.
    /// Default: `http://localhost:8000/api/v1/google/auth/callback`.
    #[serde(default = "default_redirect_url")]
    pub redirect_url: Url,

    /// Base URL of the Forms API.
    /// TOML: `google.forms_api_url`. Default: `https://forms.googleapis.com`.
    #[serde(default = "default_forms_api_url")]
    pub forms_api_url: Url,

    /// Prefix of the editor link; the form id and `/edit` are appended.
    /// TOML: `google.edit_url_base`. Default: `https://docs.google.com/forms/d/`.
    #[serde(default = "default_edit_url_base")]
    pub edit_url_base: Url,

    /// Optional upstream HTTP proxy. If set, used for reqwest clients.
    /// TOML: `google.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Allow HTTP/2 multiplexing for reqwest clients; disabled forces HTTP/1.
    /// TOML: `google.enable_multiplexing`. Default: `false`.
    #[serde(default)]
    pub enable_multiplexing: bool,

    /// TCP connect timeout for every Google call.
    /// TOML: `google.connect_timeout_secs`. Default: `10`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout for every Google call.
    /// TOML: `google.request_timeout_secs`. Default: `30`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Extra attempts for the refresh grant on transient (network, 429, 5xx) failures.
    /// TOML: `google.refresh_retry_max_times`. Default: `2`.
    #[serde(default = "default_refresh_retry_max_times")]
    pub refresh_retry_max_times: usize,
}

#[derive(Debug, Clone)]
pub struct GoogleResolvedConfig {
    pub client_secret_path: PathBuf,
    pub token_path: PathBuf,
    pub redirect_url: Url,
    pub forms_api_url: Url,
    pub edit_url_base: Url,
    pub proxy: Option<Url>,
    pub enable_multiplexing: bool,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub refresh_retry_max_times: usize,
    pub scopes: Vec<String>,
}

impl GoogleConfig {
    pub fn resolve(&self) -> GoogleResolvedConfig {
        GoogleResolvedConfig {
            client_secret_path: self.client_secret_path.clone(),
            token_path: self.token_path.clone(),
            redirect_url: self.redirect_url.clone(),
            forms_api_url: self.forms_api_url.clone(),
            edit_url_base: self.edit_url_base.clone(),
            proxy: self.proxy.clone(),
            enable_multiplexing: self.enable_multiplexing,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            refresh_retry_max_times: self.refresh_retry_max_times,
            scopes: REQUIRED_SCOPES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_secret_path: default_client_secret_path(),
            token_path: default_token_path(),
            redirect_url: default_redirect_url(),
            forms_api_url: default_forms_api_url(),
            edit_url_base: default_edit_url_base(),
            proxy: None,
            enable_multiplexing: false,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            refresh_retry_max_times: default_refresh_retry_max_times(),
        }
    }
}

fn default_client_secret_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_redirect_url() -> Url {
    Url::parse("http://localhost:8000/api/v1/google/auth/callback")
        .expect("default redirect_url must be a valid URL")
}

fn default_forms_api_url() -> Url {
    Url::parse("https://forms.googleapis.com").expect("default forms_api_url must be a valid URL")
}

fn default_edit_url_base() -> Url {
    Url::parse("https://docs.google.com/forms/d/")
        .expect("default edit_url_base must be a valid URL")
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_refresh_retry_max_times() -> usize {
    2
}
