use super::client_secret::OauthClientSecret;
use crate::error::{FormsyncError, OauthError};
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, ExtraTokenFields, RedirectUrl, RefreshToken,
    Scope, StandardRevocableToken, StandardTokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;
use url::Url;

/// Non-standard token response fields. Google adds `id_token` when `openid` is requested and
/// occasionally other keys such as `refresh_token_expires_in`.
#[derive(Clone, Deserialize, Serialize)]
pub(crate) struct GoogleTokenFields {
    pub id_token: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ExtraTokenFields for GoogleTokenFields {}

impl std::fmt::Debug for GoogleTokenFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id_token = self.id_token.as_ref().map(|_| "<redacted>");
        let mut keys: Vec<&String> = self.extra.keys().collect();
        keys.sort();

        f.debug_struct("GoogleTokenFields")
            .field("id_token", &id_token)
            .field("extra_keys", &keys)
            .finish()
    }
}

pub(crate) type OauthTokenResponse = StandardTokenResponse<GoogleTokenFields, BasicTokenType>;

type GoogleOauth2Client = OAuth2Client<
    BasicErrorResponse,
    OauthTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Stateless Google OAuth endpoints; a fresh oauth2 client is built per call from the
/// client-secret file contents.
pub(crate) struct GoogleOauthEndpoints;

impl GoogleOauthEndpoints {
    fn build_client(
        secret: &OauthClientSecret,
        redirect_uri: Option<&Url>,
    ) -> Result<GoogleOauth2Client, FormsyncError> {
        let invalid = |what: &str, e: url::ParseError| {
            FormsyncError::Configuration(format!("invalid {what} in client secret: {e}"))
        };

        let client = OAuth2Client::<
            BasicErrorResponse,
            OauthTokenResponse,
            BasicTokenIntrospectionResponse,
            StandardRevocableToken,
            BasicRevocationErrorResponse,
        >::new(ClientId::new(secret.client_id.clone()))
            .set_client_secret(ClientSecret::new(secret.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(secret.auth_uri.to_string()).map_err(|e| invalid("auth_uri", e))?,
            )
            .set_token_uri(
                TokenUrl::new(secret.token_uri.to_string()).map_err(|e| invalid("token_uri", e))?,
            );

        match redirect_uri {
            Some(redirect) => Ok(client.set_redirect_uri(
                RedirectUrl::new(redirect.to_string())
                    .map_err(|e| FormsyncError::Configuration(format!("invalid redirect uri: {e}")))?,
            )),
            None => Ok(client),
        }
    }

    /// Consent URL for the given scopes. `access_type=offline` + `prompt=consent` make Google
    /// issue a refresh token on every consent, not only the first one.
    pub(crate) fn build_authorize_url(
        secret: &OauthClientSecret,
        redirect_uri: &Url,
        scopes: &[String],
    ) -> Result<(Url, CsrfToken), FormsyncError> {
        let client = Self::build_client(secret, Some(redirect_uri))?;
        let mut req = client
            .authorize_url(CsrfToken::new_random)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");

        for scope in scopes {
            req = req.add_scope(Scope::new(scope.clone()));
        }

        Ok(req.url())
    }

    pub(crate) async fn exchange_authorization_code(
        secret: &OauthClientSecret,
        redirect_uri: &Url,
        code: AuthorizationCode,
        http_client: &reqwest::Client,
    ) -> Result<OauthTokenResponse, OauthError> {
        let client = Self::build_client(secret, Some(redirect_uri)).map_err(|e| {
            OauthError::Other {
                message: format!("failed to build oauth2 client: {e}"),
            }
        })?;

        let token: OauthTokenResponse = client
            .exchange_code(code)
            .request_async(http_client)
            .await?;
        info!("Google OAuth2 code exchange completed successfully");
        Ok(token)
    }

    pub(crate) async fn refresh_access_token(
        secret: &OauthClientSecret,
        refresh_token: &str,
        http_client: &reqwest::Client,
    ) -> Result<OauthTokenResponse, OauthError> {
        let client = Self::build_client(secret, None).map_err(|e| OauthError::Other {
            message: format!("failed to build oauth2 client: {e}"),
        })?;

        let token: OauthTokenResponse = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(http_client)
            .await?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> OauthClientSecret {
        OauthClientSecret {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            auth_uri: Url::parse("https://accounts.google.com/o/oauth2/auth").unwrap(),
            token_uri: Url::parse("https://oauth2.googleapis.com/token").unwrap(),
        }
    }

    #[test]
    fn authorize_url_carries_scopes_redirect_and_offline_access() {
        let redirect = Url::parse("http://localhost:8000/api/v1/google/auth/callback").unwrap();
        let scopes = vec![
            "https://www.googleapis.com/auth/forms.body".to_string(),
            "https://www.googleapis.com/auth/drive.file".to_string(),
        ];

        let (url, csrf) =
            GoogleOauthEndpoints::build_authorize_url(&secret(), &redirect, &scopes).unwrap();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(query.get("client_id").map(String::as_str), Some("client-id"));
        assert_eq!(query.get("response_type").map(String::as_str), Some("code"));
        assert_eq!(
            query.get("redirect_uri").map(String::as_str),
            Some(redirect.as_str())
        );
        assert_eq!(query.get("scope"), Some(&scopes.join(" ")));
        assert_eq!(query.get("access_type").map(String::as_str), Some("offline"));
        assert_eq!(query.get("prompt").map(String::as_str), Some("consent"));
        assert_eq!(query.get("state"), Some(csrf.secret()));
    }
}
