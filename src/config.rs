use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

const DEFAULT_MAX_CART_ITEM_QUANTITY: i64 = 10;
const DEFAULT_ORDER_EXPIRY_HOURS: i64 = 24;
const DEFAULT_CHECKOUT_SESSION_TTL_MINUTES: i64 = 30;
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;

/// Payment gateway connection settings. `password` is the shared secret used
/// for request signing and webhook verification.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct GatewayConfig {
    pub url: String,

    pub terminal_key: String,

    #[validate(length(min = 8))]
    pub password: String,

    /// Absolute URL the gateway posts payment-status notifications to.
    pub notification_url: String,

    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,
}

/// Checkout pipeline tunables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CheckoutConfig {
    /// Upper bound on a single cart line quantity.
    #[serde(default = "default_max_cart_item_quantity")]
    #[validate(range(min = 1, max = 1000))]
    pub max_cart_item_quantity: i64,

    /// Payment redirect window: hours until an unpaid order's initial
    /// payment attempt expires.
    #[serde(default = "default_order_expiry_hours")]
    pub order_expiry_hours: i64,

    /// How long verified checkout data stays valid between the verify and
    /// create-order calls.
    #[serde(default = "default_checkout_session_ttl_minutes")]
    pub session_ttl_minutes: i64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_cart_item_quantity: default_max_cart_item_quantity(),
            order_expiry_hours: default_order_expiry_hours(),
            session_ttl_minutes: default_checkout_session_ttl_minutes(),
        }
    }
}

/// Application configuration, loaded once at startup and passed explicitly
/// to every component that needs it.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
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

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    #[validate]
    pub gateway: GatewayConfig,

    #[serde(default)]
    #[validate]
    pub checkout: CheckoutConfig,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
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
fn default_max_cart_item_quantity() -> i64 {
    DEFAULT_MAX_CART_ITEM_QUANTITY
}
fn default_order_expiry_hours() -> i64 {
    DEFAULT_ORDER_EXPIRY_HOURS
}
fn default_checkout_session_ttl_minutes() -> i64 {
    DEFAULT_CHECKOUT_SESSION_TTL_MINUTES
}
fn default_gateway_timeout_secs() -> u64 {
    DEFAULT_GATEWAY_TIMEOUT_SECS
}

/// Loads configuration from `config/default`, an environment-specific file
/// (selected by `APP_ENVIRONMENT`) and `APP__`-prefixed env overrides, then
/// validates the result.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = env::var("APP_ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let cfg = Config::builder()
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{environment}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .set_default("environment", environment.clone())?
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    app_config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    info!(environment = %app_config.environment, "configuration loaded");
    Ok(app_config)
}

/// Installs the global tracing subscriber. Level comes from `RUST_LOG` when
/// set, otherwise from the configured log level.
pub fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("storefront_api={log_level},tower_http=info")));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
