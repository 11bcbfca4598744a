//! Portal configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_API_URL: &str = "https://app-boleto-production.up.railway.app";

/// Storage key under which the bearer token is persisted.
pub const TOKEN_STORAGE_KEY: &str = "token";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// API base URL without a trailing slash.
    pub api_url: String,
    /// When set, any role-resolution failure (including an unreachable
    /// server) clears the session.
    pub strict_role_check: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self { api_url: DEFAULT_API_URL.to_owned(), strict_role_check: false }
    }
}

impl PortalConfig {
    /// Build typed portal config from environment variables.
    ///
    /// Optional:
    /// - `PORTAL_API_URL`: API base URL (default production endpoint)
    /// - `PORTAL_STRICT_ROLE_CHECK`: `true`/`false` (default `false`)
    ///
    /// # Errors
    ///
    /// Returns an error if `PORTAL_STRICT_ROLE_CHECK` is not a boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("PORTAL_API_URL")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(|| DEFAULT_API_URL.to_owned(), |raw| normalize_base_url(&raw));

        let strict_role_check = match std::env::var("PORTAL_STRICT_ROLE_CHECK") {
            Ok(raw) => parse_bool(&raw)
                .ok_or(ConfigError::InvalidValue { var: "PORTAL_STRICT_ROLE_CHECK", value: raw })?,
            Err(_) => false,
        };

        Ok(Self { api_url, strict_role_check })
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_base_url(api_url);
        self
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

/// Parse the usual spellings of a boolean flag.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
