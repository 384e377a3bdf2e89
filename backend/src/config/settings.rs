//! Settings data structures

use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable carrying the conversion API token
pub const ENV_API_TOKEN: &str = "FILE_FLEXER_API_TOKEN";
/// Environment variable carrying the auth service base URL
pub const ENV_AUTH_URL: &str = "FILE_FLEXER_AUTH_URL";
/// Environment variable carrying the auth service public key
pub const ENV_AUTH_ANON_KEY: &str = "FILE_FLEXER_AUTH_ANON_KEY";

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Remote conversion service configuration
    #[serde(default)]
    pub convert_api: ConvertApiSettings,

    /// Remote auth service configuration
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            convert_api: ConvertApiSettings::default(),
            auth: AuthSettings::default(),
        }
    }
}

impl Settings {
    /// Overlay secrets from the environment onto the file-based settings
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(ENV_API_TOKEN) {
            self.convert_api.token = token;
        }
        if let Ok(raw) = std::env::var(ENV_AUTH_URL) {
            match Url::parse(&raw) {
                Ok(url) => self.auth.url = Some(url),
                Err(e) => tracing::warn!("Ignoring invalid {}: {}", ENV_AUTH_URL, e),
            }
        }
        if let Ok(key) = std::env::var(ENV_AUTH_ANON_KEY) {
            self.auth.anon_key = key;
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to (0.0.0.0 for LAN access)
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8686,
        }
    }
}

/// Remote conversion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertApiSettings {
    /// Base URL of the conversion service
    pub base_url: Url,

    /// Bearer token for the conversion service
    #[serde(default)]
    pub token: String,
}

impl Default for ConvertApiSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://v2.convertapi.com/").expect("valid default URL"),
            token: String::new(),
        }
    }
}

/// Remote auth service configuration
///
/// When `enabled` is false or no URL is configured, the app runs in
/// single-user mode: sign-in endpoints report the service as unavailable
/// and the route guard lets everything through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Whether account handling is enabled at all
    pub enabled: bool,

    /// Base URL of the auth service (e.g. https://xyz.supabase.co)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,

    /// Public (anon) API key for the auth service
    #[serde(default)]
    pub anon_key: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            anon_key: String::new(),
        }
    }
}
