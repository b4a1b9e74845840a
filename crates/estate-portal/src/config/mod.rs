use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_LISTINGS_BASE_URL: &str = "https://api.propstack.de/v2";
pub const LISTINGS_API_KEY_VAR: &str = "PROPSTACK_API_KEY";
pub const MAPS_API_KEY_VAR: &str = "MAPS_API_KEY";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub listings: ListingsConfig,
    pub maps: MapConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            listings: ListingsConfig::from_env()?,
            maps: MapConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Upstream listings API access and proxy caching.
#[derive(Debug, Clone)]
pub struct ListingsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub page_size: u32,
    pub cache_ttl: Duration,
    pub status_cache_ttl: Duration,
    pub request_timeout: Duration,
    /// Upstream status codes treated as "actively marketed".
    pub active_statuses: Vec<u32>,
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LISTINGS_BASE_URL.to_string(),
            page_size: 100,
            cache_ttl: Duration::from_secs(300),
            status_cache_ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(15),
            active_statuses: crate::listings::statuses::ACTIVE_STATUS_IDS.to_vec(),
        }
    }
}

impl ListingsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let active_statuses = match non_empty_var("LISTINGS_ACTIVE_STATUSES") {
            Some(raw) => parse_status_list(&raw)?,
            None => defaults.active_statuses,
        };

        Ok(Self {
            api_key: non_empty_var(LISTINGS_API_KEY_VAR),
            base_url: non_empty_var("PROPSTACK_BASE_URL").unwrap_or(defaults.base_url),
            page_size: number_var("LISTINGS_PAGE_SIZE", defaults.page_size)?,
            cache_ttl: seconds_var("LISTINGS_CACHE_SECONDS", defaults.cache_ttl)?,
            status_cache_ttl: seconds_var("STATUS_CACHE_SECONDS", defaults.status_cache_ttl)?,
            request_timeout: seconds_var("UPSTREAM_TIMEOUT_SECONDS", defaults.request_timeout)?,
            active_statuses,
        })
    }

    /// The listings credential, or an explicit configuration error naming the variable.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential {
                var: LISTINGS_API_KEY_VAR,
            })
    }

    /// Comma-joined allow-list, as the upstream `status` query parameter expects it.
    pub fn active_status_filter(&self) -> String {
        self.active_statuses
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Map provider credentials and geocoding deadline.
#[derive(Debug, Clone)]
pub struct MapConfig {
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl MapConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: non_empty_var(MAPS_API_KEY_VAR),
            timeout: seconds_var("MAPS_TIMEOUT_SECONDS", Self::default().timeout)?,
        })
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential {
                var: MAPS_API_KEY_VAR,
            })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn number_var(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match non_empty_var(name) {
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { var: name, value }),
        None => Ok(default),
    }
}

fn seconds_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match non_empty_var(name) {
        Some(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidNumber { var: name, value }),
        None => Ok(default),
    }
}

fn parse_status_list(raw: &str) -> Result<Vec<u32>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>().map_err(|_| ConfigError::InvalidNumber {
                var: "LISTINGS_ACTIVE_STATUSES",
                value: part.to_string(),
            })
        })
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str, value: String },
    MissingCredential { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a non-negative integer, got '{value}'")
            }
            ConfigError::MissingCredential { var } => write!(f, "{var} is not set"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::MissingCredential { .. } => None,
        }
    }
}
