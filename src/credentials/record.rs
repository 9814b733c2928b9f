use super::endpoints::OauthTokenResponse;
use chrono::{DateTime, Duration, Utc};
use oauth2::TokenResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Access tokens are treated as expired this many minutes before their real expiry.
const EXPIRY_SKEW_MINUTES: i64 = 5;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// The persisted delegated-access token set.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// `token` is what google-auth writes into `token.json`.
    #[serde(alias = "token", default)]
    pub access_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    pub expiry: DateTime<Utc>,

    #[serde(default)]
    pub scopes: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// Access token present and not expired.
    Valid,
    /// Expired (or no access token) but a refresh token is available.
    Refreshable,
    /// Needs a fresh authorization-code exchange.
    Invalid,
}

impl CredentialRecord {
    /// Build a record from a code-exchange response. When the provider omits `scope`, the
    /// requested scopes were granted as-is.
    pub(crate) fn from_token_response(
        token: &OauthTokenResponse,
        requested_scopes: &[String],
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            access_token: String::new(),
            token_type: default_token_type(),
            refresh_token: None,
            expiry: now,
            scopes: requested_scopes.iter().cloned().collect(),
        };
        record.apply_token_response(token, now);
        record
    }

    /// Merge a token response into this record. Absent optional fields (refresh token,
    /// scopes) keep their current values, matching Google's refresh responses.
    pub(crate) fn apply_token_response(&mut self, token: &OauthTokenResponse, now: DateTime<Utc>) {
        self.access_token = token.access_token().secret().to_string();
        self.token_type = token.token_type().as_ref().to_string();

        if let Some(refresh) = token.refresh_token() {
            self.refresh_token = Some(refresh.secret().to_string());
        }
        if let Some(scopes) = token.scopes() {
            self.scopes = scopes.iter().map(|s| s.as_str().to_owned()).collect();
        }

        let lifetime = token
            .expires_in()
            .and_then(|d| Duration::from_std(d).ok())
            .unwrap_or_else(|| Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS));
        self.expiry = now + lifetime;
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::minutes(EXPIRY_SKEW_MINUTES) >= self.expiry
    }

    pub fn missing_scopes<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|scope| !self.scopes.contains(scope.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Classify the record. A record lacking any required scope is invalid: only a new
    /// consent can widen the grant.
    pub fn state_at(&self, now: DateTime<Utc>, required_scopes: &[String]) -> CredentialState {
        if !self.missing_scopes(required_scopes).is_empty() {
            return CredentialState::Invalid;
        }
        let has_access = !self.access_token.trim().is_empty();
        let has_refresh = self
            .refresh_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());

        if has_access && !self.is_expired_at(now) {
            CredentialState::Valid
        } else if has_refresh {
            CredentialState::Refreshable
        } else {
            CredentialState::Invalid
        }
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expiry", &self.expiry)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}
