use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use crate::colors::ColorMode;
use crate::error::{OpenDataError, Result};

/// Root of the Treasury FiscalData REST API
pub const FISCAL_DATA_BASE_URL: &str =
    "https://api.fiscaldata.treasury.gov/services/api/fiscal_service";

/// Seconds every request may take before it is reported as a timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = open_data_ckan::DEFAULT_TIMEOUT_SECS;

/// `page[size]` sent when the caller does not choose one
pub const DEFAULT_PAGE_SIZE: u32 = 100;

const DEFAULT_USER_AGENT: &str = concat!("open-data-rs/", env!("CARGO_PKG_VERSION"));

/// Configuration for the FiscalData client
#[derive(Debug, Clone)]
pub struct FiscalDataConfig {
    /// API root; endpoint paths are appended to it
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Page size used when a request does not set `page[size]`
    pub default_page_size: u32,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Color handling for human-readable output
    pub color_mode: ColorMode,
}

impl Default for FiscalDataConfig {
    fn default() -> Self {
        Self {
            base_url: FISCAL_DATA_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_page_size: DEFAULT_PAGE_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            color_mode: ColorMode::default(),
        }
    }
}

impl FiscalDataConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `FISCAL_DATA_BASE_URL`, `FISCAL_DATA_TIMEOUT_SECS`
    /// and `FISCAL_DATA_USER_AGENT`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = env::var("FISCAL_DATA_BASE_URL") {
            config = config.with_base_url(url)?;
        }
        if let Ok(secs) = env::var("FISCAL_DATA_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                OpenDataError::config_error(format!(
                    "FISCAL_DATA_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    secs
                ))
            })?;
            config = config.with_timeout(secs);
        }
        if let Ok(ua) = env::var("FISCAL_DATA_USER_AGENT") {
            config = config.with_user_agent(ua);
        }
        Ok(config)
    }

    /// Point the client at another API root (a mirror or a mock server)
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs.max(1);
        self
    }

    /// Set custom user agent
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for the CKAN portal facade
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Site roots replacing the registered ones, keyed by country code
    pub overrides: BTreeMap<String, String>,
    /// Color handling for harness output
    pub color_mode: ColorMode,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            overrides: BTreeMap::new(),
            color_mode: ColorMode::default(),
        }
    }
}

impl PortalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `CKAN_USER_AGENT` and `CKAN_PORTAL_<CODE>_URL`
    /// (e.g. `CKAN_PORTAL_UK_URL`).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(ua) = env::var("CKAN_USER_AGENT") {
            config = config.with_user_agent(ua);
        }
        for code in open_data_ckan::portals::codes() {
            let key = format!("CKAN_PORTAL_{}_URL", code.to_uppercase());
            if let Ok(url) = env::var(&key) {
                config = config.with_portal(code, url)?;
            }
        }
        Ok(config)
    }

    /// Replace the site root of one registered portal
    pub fn with_portal<C: AsRef<str>, S: Into<String>>(
        mut self,
        code: C,
        site_root: S,
    ) -> Result<Self> {
        let code = code.as_ref().to_lowercase();
        if open_data_ckan::portals::find(&code).is_none() {
            return Err(OpenDataError::unknown_country(code));
        }
        let site_root = site_root.into();
        url::Url::parse(&site_root)?;
        self.overrides.insert(code, site_root);
        Ok(self)
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs.max(1);
        self
    }

    /// Set custom user agent
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiscal_defaults() {
        let config = FiscalDataConfig::new();
        assert_eq!(config.base_url, FISCAL_DATA_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.default_page_size, 100);
    }

    #[test]
    fn test_base_url_is_validated_and_trimmed() {
        let config = FiscalDataConfig::new()
            .with_base_url("http://127.0.0.1:9000/")
            .expect("valid url");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert!(FiscalDataConfig::new().with_base_url("not a url").is_err());
    }

    #[test]
    fn test_portal_override_requires_known_country() {
        let config = PortalConfig::new()
            .with_portal("UK", "http://localhost:8080")
            .expect("uk is registered");
        assert_eq!(
            config.overrides.get("uk").map(String::as_str),
            Some("http://localhost:8080")
        );

        match PortalConfig::new().with_portal("xx", "http://localhost") {
            Err(OpenDataError::UnknownCountry { code, valid }) => {
                assert_eq!(code, "xx");
                assert!(valid.starts_with("us, uk"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
