mod basic;
mod google;

pub use basic::BasicConfig;
pub use google::{FORMSYNC_USER_AGENT, GoogleConfig, GoogleResolvedConfig, REQUIRED_SCOPES};

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Google OAuth + Forms API settings (see `google` table in config.toml).
    #[serde(default)]
    pub google: GoogleConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration from the TOML file (with defaults) and validates required fields.
    pub fn from_toml() -> Self {
        if !PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            panic!("config file not found: {}", DEFAULT_CONFIG_FILE);
        }
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!(
                "failed to extract configuration from {}: {err}",
                DEFAULT_CONFIG_FILE
            )
        });
        if cfg.basic.formsync_key.trim().is_empty() {
            panic!("basic.formsync_key must be set and non-empty");
        }
        cfg
    }

    pub fn google(&self) -> GoogleResolvedConfig {
        self.google.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Toml;

    #[test]
    fn defaults_match_local_development_setup() {
        let cfg = Config::default();
        assert_eq!(cfg.basic.listen_port, 8000);
        assert_eq!(cfg.basic.loglevel, "info");

        let google = cfg.google();
        assert_eq!(google.client_secret_path, PathBuf::from("credentials.json"));
        assert_eq!(google.token_path, PathBuf::from("token.json"));
        assert_eq!(
            google.redirect_url.as_str(),
            "http://localhost:8000/api/v1/google/auth/callback"
        );
        assert_eq!(google.scopes.len(), 2);
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                formsync_key = 1234
                listen_port = 9000

                [google]
                token_path = "/var/lib/formsync/token.json"
                request_timeout_secs = 5
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(cfg.basic.formsync_key, "1234");
        assert_eq!(cfg.basic.listen_port, 9000);
        let google = cfg.google();
        assert_eq!(
            google.token_path,
            PathBuf::from("/var/lib/formsync/token.json")
        );
        assert_eq!(google.request_timeout.as_secs(), 5);
        assert_eq!(google.forms_api_url.as_str(), "https://forms.googleapis.com/");
    }

    #[test]
    fn formsync_key_is_trimmed_and_must_be_scalar() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                formsync_key = "  s3cret  "
                listen_addr = "127.0.0.1"
                "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(cfg.basic.formsync_key, "s3cret");
        assert_eq!(cfg.basic.socket_addr().to_string(), "127.0.0.1:8000");

        let err = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string("[basic]\nformsync_key = true\n"))
            .extract::<Config>()
            .unwrap_err();
        assert!(err.to_string().contains("formsync_key"), "error: {err}");
    }
}
