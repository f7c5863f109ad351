//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Access token validation.
    pub auth: AuthConfig,
    /// Realtime change notifications.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Query cache sizing.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Bill storage backend.
    #[serde(default)]
    pub billing: BillingConfig,
    /// Log output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Access token configuration.
///
/// Tokens are issued by the hosted auth service and only validated here.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret of the auth service.
    pub jwt_secret: String,
    /// Expected `aud` claim.
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_audience() -> String {
    "authenticated".to_string()
}

/// Where change notifications come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealtimeMode {
    /// `LISTEN` on the database's `NOTIFY` channels.
    #[default]
    Postgres,
    /// The API publishes its own writes in-process. Single node only.
    Local,
    /// No channels; live views refresh on demand only.
    Off,
}

/// Realtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Notification source.
    #[serde(default)]
    pub mode: RealtimeMode,
    /// Prefix of the `NOTIFY` channel names, `{prefix}:{table}`.
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
    /// Per-channel notification buffer.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            mode: RealtimeMode::default(),
            channel_prefix: default_channel_prefix(),
            buffer: default_buffer(),
        }
    }
}

fn default_channel_prefix() -> String {
    "realtime".to_string()
}

fn default_buffer() -> usize {
    64
}

/// Query cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached result sets.
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    /// Time-to-live for a cached result set.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_capacity() -> u64 {
    1_000
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

/// Which collaborator stores bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillBackend {
    /// The `bills` table.
    #[default]
    Relational,
    /// The spreadsheet endpoint.
    Sheet,
}

/// Billing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Active bill backend.
    #[serde(default)]
    pub backend: BillBackend,
    /// Spreadsheet endpoint URL, required when `backend = "sheet"`.
    pub sheet_url: Option<String>,
    /// Request timeout for the spreadsheet endpoint.
    #[serde(default = "default_sheet_timeout")]
    pub timeout_secs: u64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            backend: BillBackend::default(),
            sheet_url: None,
            timeout_secs: default_sheet_timeout(),
        }
    }
}

fn default_sheet_timeout() -> u64 {
    10
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KHATA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("KHATA__DATABASE__URL", Some("postgres://localhost/khata_test")),
                ("KHATA__AUTH__JWT_SECRET", Some("test-secret")),
                ("KHATA__BILLING__BACKEND", Some("sheet")),
                ("KHATA__BILLING__SHEET_URL", Some("https://sheets.example/exec")),
                ("KHATA__REALTIME__MODE", Some("local")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/khata_test");
                assert_eq!(config.auth.jwt_secret, "test-secret");
                assert_eq!(config.auth.audience, "authenticated");
                assert_eq!(config.billing.backend, BillBackend::Sheet);
                assert_eq!(
                    config.billing.sheet_url.as_deref(),
                    Some("https://sheets.example/exec")
                );
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.realtime.mode, RealtimeMode::Local);
                assert_eq!(config.realtime.channel_prefix, "realtime");
            },
        );
    }

    #[test]
    fn test_section_defaults() {
        let cache = CacheConfig::default();
        assert_eq!(cache.max_capacity, 1_000);
        assert_eq!(cache.ttl_secs, 300);

        let billing = BillingConfig::default();
        assert_eq!(billing.backend, BillBackend::Relational);
        assert!(billing.sheet_url.is_none());
        assert!(!LoggingConfig::default().json);

        let realtime = RealtimeConfig::default();
        assert_eq!(realtime.mode, RealtimeMode::Postgres);
        assert_eq!(realtime.buffer, 64);
    }
}
