use super::client_secret::OauthClientSecret;
use super::endpoints::GoogleOauthEndpoints;
use super::record::{CredentialRecord, CredentialState};
use super::store::{CredentialStore, StoreGuard};
use crate::config::GoogleResolvedConfig;
use crate::error::{FormsyncError, IsRetryable, OauthError};
use backon::{ExponentialBuilder, Retryable};
use chrono::Utc;
use oauth2::{AuthorizationCode, CsrfToken};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Owns the delegated-access lifecycle: consent URL, code exchange, and refresh.
///
/// The only path to the token artifact is through [`CredentialStore`]; load, check, refresh
/// and save run under one store lock so concurrent callers never refresh twice or tear the
/// record.
pub struct CredentialManager {
    cfg: Arc<GoogleResolvedConfig>,
    store: CredentialStore,
    http: reqwest::Client,
    retry_policy: ExponentialBuilder,
}

impl CredentialManager {
    pub fn new(cfg: Arc<GoogleResolvedConfig>, http: reqwest::Client) -> Self {
        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(cfg.refresh_retry_max_times)
            .with_jitter();
        let store = CredentialStore::new(cfg.token_path.clone());
        Self {
            cfg,
            store,
            http,
            retry_policy,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    async fn client_secret(&self) -> Result<OauthClientSecret, FormsyncError> {
        OauthClientSecret::load(&self.cfg.client_secret_path).await
    }

    /// Consent URL bound to the required scopes and `redirect_uri`, plus the CSRF state the
    /// caller must check on the way back.
    pub async fn build_authorization_url(
        &self,
        redirect_uri: &Url,
    ) -> Result<(Url, CsrfToken), FormsyncError> {
        let secret = self.client_secret().await?;
        GoogleOauthEndpoints::build_authorize_url(&secret, redirect_uri, &self.cfg.scopes)
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &Url,
    ) -> Result<CredentialRecord, FormsyncError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(FormsyncError::AuthExchange(OauthError::Flow {
                code: "missing_code".to_string(),
                message: "authorization code is empty".to_string(),
            }));
        }

        let secret = self.client_secret().await?;
        let token = GoogleOauthEndpoints::exchange_authorization_code(
            &secret,
            redirect_uri,
            AuthorizationCode::new(code.to_string()),
            &self.http,
        )
        .await
        .map_err(FormsyncError::from_exchange)?;

        let guard = self.store.lock().await;
        let mut record = CredentialRecord::from_token_response(&token, &self.cfg.scopes, Utc::now());

        let missing: Vec<String> = record
            .missing_scopes(&self.cfg.scopes)
            .into_iter()
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "consent granted without all required scopes");
            return Err(FormsyncError::AuthExchange(
                OauthError::InsufficientScope { missing },
            ));
        }

        if record.refresh_token.is_none()
            && let Ok(Some(previous)) = guard.load().await
        {
            record.refresh_token = previous.refresh_token;
        }

        guard.save(&record).await?;
        info!(
            expiry = %record.expiry,
            has_refresh_token = record.refresh_token.is_some(),
            "Google credential stored"
        );
        Ok(record)
    }

    /// A usable credential, or `None` when the interactive flow must restart.
    ///
    /// Refresh failures of any kind (revoked grant, network, unreadable record, missing client
    /// secret) are logged and reported as `None`; the stored record is left untouched.
    pub async fn get_valid_credentials(&self) -> Option<CredentialRecord> {
        let guard = self.store.lock().await;

        let record = match guard.load().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(path = %self.store.path().display(), "no stored credential");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "stored credential is unreadable; re-authorization required");
                return None;
            }
        };

        match record.state_at(Utc::now(), &self.cfg.scopes) {
            CredentialState::Valid => Some(record),
            CredentialState::Refreshable => self.refresh_locked(&guard, record).await,
            CredentialState::Invalid => {
                info!("stored credential is expired or under-scoped; re-authorization required");
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.get_valid_credentials().await.is_some()
    }

    async fn refresh_locked(
        &self,
        guard: &StoreGuard<'_>,
        mut record: CredentialRecord,
    ) -> Option<CredentialRecord> {
        let refresh_token = record.refresh_token.clone()?;

        let secret = match self.client_secret().await {
            Ok(secret) => secret,
            Err(e) => {
                warn!(error = %e, "cannot refresh credential without client secret");
                return None;
            }
        };

        let result = (|| async {
            GoogleOauthEndpoints::refresh_access_token(&secret, &refresh_token, &self.http).await
        })
        .retry(self.retry_policy)
        .when(|e: &OauthError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("Google token refresh retrying after error {}, sleeping {:?}", err, dur);
        })
        .await;

        let token = match result {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "credential refresh failed; re-authorization required");
                return None;
            }
        };

        record.apply_token_response(&token, Utc::now());
        if let Err(e) = guard.save(&record).await {
            error!(error = %e, "refreshed credential could not be persisted");
        } else {
            info!(expiry = %record.expiry, "Google credential refreshed");
        }
        Some(record)
    }
}
