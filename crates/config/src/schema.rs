//! Config schema types (gateway, auth, nlu, media, database).

use {
    secrecy::Secret,
    serde::Deserialize,
};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CarbotConfig {
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    pub nlu: NluConfig,
    pub media: MediaConfig,
    pub database: DatabaseConfig,
}

/// Bind address and port for the HTTP/WebSocket listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

/// Shared secret for verifying message credentials.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<Secret<String>>,
}

/// Natural-language-understanding service (Wit.ai-compatible).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NluConfig {
    pub base_url: String,
    /// API version tag passed as the `v` query parameter.
    pub api_version: String,
    pub token: Option<Secret<String>>,
    pub timeout_seconds: u64,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.wit.ai".into(),
            api_version: "20240909".into(),
            token: None,
            timeout_seconds: 10,
        }
    }
}

/// Image-search service (Unsplash-compatible).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub base_url: String,
    pub access_key: Option<Secret<String>>,
    pub timeout_seconds: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.unsplash.com".into(),
            access_key: None,
            timeout_seconds: 10,
        }
    }
}

/// SQLite database location. `None` means `<data dir>/carbot.db`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<std::path::PathBuf>,
}
