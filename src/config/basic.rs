use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// `[basic]` table: where the server listens and how the form route is guarded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BasicConfig {
    /// TOML: `basic.listen_addr`. Default: `0.0.0.0`.
    pub listen_addr: IpAddr,

    /// TOML: `basic.listen_port`. Default: `8000`.
    pub listen_port: u16,

    /// Fallback directive for the tracing `EnvFilter` when `RUST_LOG` is unset.
    /// TOML: `basic.loglevel`. Default: `info`.
    pub loglevel: String,

    /// Shared key for `POST /api/v1/google/forms`. Numbers are accepted and kept as
    /// their decimal text; surrounding whitespace is dropped.
    /// TOML: `basic.formsync_key`. No default; `Config::from_toml()` rejects an empty key.
    #[serde(deserialize_with = "deserialize_key")]
    pub formsync_key: String,

    /// Drop the `Secure` attribute from the OAuth state cookie (plain-HTTP local use).
    /// TOML: `basic.insecure_cookie`. Default: `false`.
    pub insecure_cookie: bool,
}

impl BasicConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.listen_port)
    }
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: 8000,
            loglevel: "info".to_string(),
            formsync_key: String::new(),
            insecure_cookie: false,
        }
    }
}

fn deserialize_key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "basic.formsync_key must be a string or a number, got {other}"
        ))),
    }
}
