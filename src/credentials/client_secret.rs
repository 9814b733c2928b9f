use crate::error::FormsyncError;
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// OAuth client parameters from the JSON downloaded from the Google Cloud console.
///
/// Re-read on every authorization-flow operation so the file can be dropped in without a
/// restart.
#[derive(Clone, Deserialize)]
pub struct OauthClientSecret {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: Url,
    pub token_uri: Url,
}

impl std::fmt::Debug for OauthClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OauthClientSecret")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_uri", &self.auth_uri.as_str())
            .field("token_uri", &self.token_uri.as_str())
            .finish()
    }
}

#[derive(Deserialize)]
struct ClientSecretFile {
    web: Option<OauthClientSecret>,
    installed: Option<OauthClientSecret>,
}

impl OauthClientSecret {
    pub async fn load(path: &Path) -> Result<Self, FormsyncError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FormsyncError::Configuration(format!(
                    "missing {}; create an OAuth client in the Google Cloud console and save its JSON there",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(FormsyncError::Configuration(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        Self::parse(&contents).map_err(|message| {
            FormsyncError::Configuration(format!("{}: {message}", path.display()))
        })
    }

    /// Accepts both `web` and `installed` client types; `web` wins when both are present.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let file: ClientSecretFile =
            serde_json::from_str(contents).map_err(|e| format!("invalid client secret JSON: {e}"))?;
        let secret = file
            .web
            .or(file.installed)
            .ok_or_else(|| "expected a `web` or `installed` client section".to_string())?;
        if secret.client_id.trim().is_empty() {
            return Err("client_id is empty".to_string());
        }
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_web_client() {
        let secret = OauthClientSecret::parse(
            r#"{
                "web": {
                    "client_id": "123.apps.googleusercontent.com",
                    "project_id": "formsync",
                    "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                    "token_uri": "https://oauth2.googleapis.com/token",
                    "client_secret": "shh",
                    "redirect_uris": ["http://localhost:8000/api/v1/google/auth/callback"]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.token_uri.as_str(), "https://oauth2.googleapis.com/token");
        assert!(!format!("{secret:?}").contains("shh"));
    }

    #[test]
    fn parses_installed_client() {
        let secret = OauthClientSecret::parse(
            r#"{"installed": {
                "client_id": "desktop",
                "client_secret": "s",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token"
            }}"#,
        )
        .unwrap();
        assert_eq!(secret.client_id, "desktop");
    }

    #[test]
    fn rejects_file_without_client_section() {
        let err = OauthClientSecret::parse(r#"{"type": "service_account"}"#).unwrap_err();
        assert!(err.contains("`web` or `installed`"));
    }

    #[tokio::test]
    async fn missing_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = OauthClientSecret::load(&dir.path().join("credentials.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, FormsyncError::Configuration(ref m) if m.contains("credentials.json")));
    }
}
