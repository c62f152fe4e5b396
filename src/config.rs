use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use url::Url;
use validator::Validate;

use crate::errors::GatewayError;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Worldpay select-junior endpoints. Overridable per installation, but
/// these are the documented defaults.
const DEFAULT_LIVE_URL: &str = "https://secure.worldpay.com/wcc/purchase";
const DEFAULT_TEST_URL: &str = "https://secure-test.worldpay.com/wcc/purchase";

/// Route the provider posts its Payment Response to. Must match the
/// "Payment Response URL" configured in the Worldpay installation.
pub const NOTIFY_PATH: &str = "/payment/notify/worldpay";

/// Whether the gateway talks to the provider's live or test environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    Live,
    Test,
}

/// Protocol variant. The original module shipped parallel gateway
/// implementations; a single configurable selector replaces them.
/// Only the classic hosted-page redirect carries live protocol logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayVariant {
    ClassicRedirect,
    Direct,
}

/// Fixed result the provider should simulate while in test mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    Authorised,
    Refused,
    Error,
    Captured,
}

impl TestResult {
    pub fn as_provider_code(&self) -> &'static str {
        match self {
            TestResult::Authorised => "AUTHORISED",
            TestResult::Refused => "REFUSED",
            TestResult::Error => "ERROR",
            TestResult::Captured => "CAPTURED",
        }
    }
}

/// Application configuration with validation.
///
/// `md5_salt` and `password` are shared secrets; they must never appear
/// in log output or error messages.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct GatewaySettings {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to create the schema on startup (sqlite/dev only)
    #[serde(default)]
    pub auto_migrate: bool,

    /// Public origin of this site, used for callback and return URLs
    /// and sent to the provider as `M_http_host`.
    #[validate(url)]
    pub base_url: String,

    /// Site title passed to the provider's custom pages (`C_siteTitle`)
    pub site_title: String,

    /// Optional site identifier for multi-site Worldpay accounts (`MC_siteId`)
    #[serde(default)]
    pub site_id: Option<String>,

    /// Protocol variant selector
    #[serde(default = "default_variant")]
    pub variant: GatewayVariant,

    /// Live or test provider environment
    #[serde(default = "default_mode")]
    pub mode: GatewayMode,

    /// Worldpay installation ID (`instId`)
    #[validate(length(min = 1))]
    pub installation_id: String,

    /// Secret key the outbound signature is salted with
    #[validate(length(min = 1))]
    pub md5_salt: String,

    /// Require the installation password (`callbackPW`) on notifications
    #[serde(default)]
    pub use_password: bool,

    /// Installation password, checked against `callbackPW` when
    /// `use_password` is enabled
    #[serde(default)]
    pub password: Option<String>,

    /// Send the test-mode marker field with redirect requests
    #[serde(default)]
    pub test_mode: bool,

    /// Fixed transaction result requested while in test mode
    #[serde(default = "default_test_result")]
    pub test_result: TestResult,

    /// Live payment page URL
    #[serde(default = "default_live_url")]
    #[validate(url)]
    pub live_url: String,

    /// Test payment page URL
    #[serde(default = "default_test_url")]
    #[validate(url)]
    pub test_url: String,

    /// Force https on the notification callback URL
    #[serde(default)]
    pub use_ssl: bool,

    /// Force http on the shopper return links (used together with
    /// `use_ssl` when the storefront itself is not behind TLS)
    #[serde(default)]
    pub force_non_ssl_links: bool,

    /// Log raw notification payloads (secrets redacted)
    #[serde(default)]
    pub debug_payloads: bool,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_variant() -> GatewayVariant {
    GatewayVariant::ClassicRedirect
}
fn default_mode() -> GatewayMode {
    GatewayMode::Test
}
fn default_test_result() -> TestResult {
    TestResult::Authorised
}
fn default_live_url() -> String {
    DEFAULT_LIVE_URL.to_string()
}
fn default_test_url() -> String {
    DEFAULT_TEST_URL.to_string()
}

impl GatewaySettings {
    /// URL of the provider's hosted payment page for the configured mode.
    pub fn payment_page_url(&self) -> &str {
        match self.mode {
            GatewayMode::Live => &self.live_url,
            GatewayMode::Test => &self.test_url,
        }
    }

    /// Scheme and host of this site, as sent in `M_http_host`.
    pub fn http_host(&self) -> Result<String, GatewayError> {
        let url = self.parse_base()?;
        let mut host = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
        if let Some(port) = url.port() {
            host.push_str(&format!(":{}", port));
        }
        Ok(host)
    }

    /// Absolute URL the provider must post its Payment Response to.
    pub fn notify_url(&self) -> Result<String, GatewayError> {
        let mut url = self.parse_base()?;
        if self.use_ssl {
            let _ = url.set_scheme("https");
        }
        url.set_path(NOTIFY_PATH);
        Ok(url.to_string())
    }

    /// Browser return URL for a completed checkout.
    pub fn return_url(&self, order_number: &str) -> Result<String, GatewayError> {
        self.shopper_url(order_number, "return")
    }

    /// Browser return URL for a cancelled checkout.
    pub fn cancel_url(&self, order_number: &str) -> Result<String, GatewayError> {
        self.shopper_url(order_number, "cancel")
    }

    fn shopper_url(&self, order_number: &str, step: &str) -> Result<String, GatewayError> {
        let mut url = self.parse_base()?;
        if self.force_non_ssl_links {
            let _ = url.set_scheme("http");
        }
        url.set_path(&format!("/checkout/{}/payment/{}", order_number, step));
        Ok(url.to_string())
    }

    fn parse_base(&self) -> Result<Url, GatewayError> {
        Url::parse(&self.base_url)
            .map_err(|e| GatewayError::Config(format!("invalid base_url: {}", e)))
    }

    pub fn is_test(&self) -> bool {
        self.mode == GatewayMode::Test
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Loads configuration from `config/default.toml` (optional), an
/// environment-specific file, and `APP__*` environment variables.
pub fn load_settings() -> Result<GatewaySettings, GatewayError> {
    let environment = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let settings: GatewaySettings = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, environment)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()
        .map_err(|e| GatewayError::Config(e.to_string()))?
        .try_deserialize()
        .map_err(|e| GatewayError::Config(e.to_string()))?;

    settings
        .validate()
        .map_err(|e| GatewayError::Config(e.to_string()))?;

    if settings.variant == GatewayVariant::Direct {
        return Err(GatewayError::Config(
            "the direct (on-site API) variant is not supported; use classic_redirect".to_string(),
        ));
    }

    if settings.use_password && settings.password.as_deref().unwrap_or("").is_empty() {
        return Err(GatewayError::Config(
            "use_password is enabled but no installation password is set".to_string(),
        ));
    }

    Ok(settings)
}

/// Initializes the tracing subscriber with env-filter support.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("worldpay_gateway={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter =
        EnvFilter::try_new(filter_directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init();
    }
}

/// Settings fixture shared by unit and integration tests.
pub fn test_settings() -> GatewaySettings {
    GatewaySettings {
        database_url: "sqlite::memory:".to_string(),
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_PORT,
        environment: "test".to_string(),
        log_level: DEFAULT_LOG_LEVEL.to_string(),
        log_json: false,
        auto_migrate: true,
        base_url: "https://shop.example.com".to_string(),
        site_title: "Example Shop".to_string(),
        site_id: None,
        variant: GatewayVariant::ClassicRedirect,
        mode: GatewayMode::Test,
        installation_id: "211616".to_string(),
        md5_salt: "wp-secret".to_string(),
        use_password: false,
        password: None,
        test_mode: false,
        test_result: TestResult::Authorised,
        live_url: DEFAULT_LIVE_URL.to_string(),
        test_url: DEFAULT_TEST_URL.to_string(),
        use_ssl: false,
        force_non_ssl_links: false,
        debug_payloads: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_page_url_follows_mode() {
        let mut settings = test_settings();
        assert_eq!(settings.payment_page_url(), DEFAULT_TEST_URL);
        settings.mode = GatewayMode::Live;
        assert_eq!(settings.payment_page_url(), DEFAULT_LIVE_URL);
    }

    #[test]
    fn notify_url_uses_fixed_route() {
        let settings = test_settings();
        assert_eq!(
            settings.notify_url().unwrap(),
            "https://shop.example.com/payment/notify/worldpay"
        );
    }

    #[test]
    fn use_ssl_forces_https_on_callback() {
        let mut settings = test_settings();
        settings.base_url = "http://shop.example.com".to_string();
        settings.use_ssl = true;
        assert!(settings.notify_url().unwrap().starts_with("https://"));
    }

    #[test]
    fn force_non_ssl_rewrites_shopper_links() {
        let mut settings = test_settings();
        settings.force_non_ssl_links = true;
        let url = settings.return_url("ORD-1001").unwrap();
        assert_eq!(
            url,
            "http://shop.example.com/checkout/ORD-1001/payment/return"
        );
    }

    #[test]
    fn http_host_keeps_port() {
        let mut settings = test_settings();
        settings.base_url = "http://localhost:8080".to_string();
        assert_eq!(settings.http_host().unwrap(), "http://localhost:8080");
    }

    #[test]
    fn test_result_codes_match_provider_vocabulary() {
        assert_eq!(TestResult::Authorised.as_provider_code(), "AUTHORISED");
        assert_eq!(TestResult::Captured.as_provider_code(), "CAPTURED");
    }
}
