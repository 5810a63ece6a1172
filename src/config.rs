use clap::Parser;
use std::time::Duration;
use thiserror::Error;

/// Command-line flags, each overridable through a `GEOIP_*` variable.
#[derive(Debug, Parser)]
#[command(name = "geoipd", version, about = "GeoIP lookup service with hot-swapped MaxMind databases")]
pub struct Cli {
    /// MaxMind license key
    #[arg(short = 'l', long = "license", env = "GEOIP_LICENSE", hide_env_values = true)]
    pub license: Option<String>,

    /// MaxMind account id
    #[arg(short = 'a', long = "account-id", env = "GEOIP_ACCOUNT_ID", default_value = "0")]
    pub account_id: String,

    /// Address to bind the HTTP listener to
    #[arg(short = 'b', long = "bindip", env = "GEOIP_BINDIP", default_value = "0.0.0.0")]
    pub bind_ip: String,

    /// Port to listen on
    #[arg(short = 'p', long = "port", env = "GEOIP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Hours between database updates
    #[arg(short = 'u', long = "update-interval", env = "GEOIP_UPDATE_INTERVAL", default_value_t = 24)]
    pub update_interval: u64,

    /// Database edition to download
    #[arg(short = 'e', long = "edition", env = "GEOIP_EDITION", default_value = "GeoLite2-City")]
    pub edition: String,

    /// Route prefix of the lookup endpoints
    #[arg(short = 'r', long = "route-prefix", env = "GEOIP_ROUTE_PREFIX", default_value = "/geoip")]
    pub route_prefix: String,

    /// Comma separated list of allowed CORS origins, `*` for any
    #[arg(short = 'o', long = "allowed-origins", env = "GEOIP_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Load the database from a local file (plain or gzipped) instead of downloading it
    #[arg(long = "database-path", env = "GEOIP_DATABASE_PATH")]
    pub database_path: Option<String>,

    /// Base URL of the MaxMind update service
    #[arg(long = "update-url", env = "GEOIP_UPDATE_URL", default_value = crate::adapters::outbound::DEFAULT_UPDATE_URL)]
    pub update_url: String,

    /// Upper bound for a single database download, in seconds
    #[arg(long = "fetch-timeout-secs", env = "GEOIP_FETCH_TIMEOUT_SECS", default_value_t = 300)]
    pub fetch_timeout_secs: u64,

    /// Maximum random delay added to each update interval, in seconds
    #[arg(long = "refresh-jitter-secs", env = "GEOIP_REFRESH_JITTER_SECS", default_value_t = 0)]
    pub refresh_jitter_secs: u64,

    /// Enable debug logging
    #[arg(long = "debug", env = "DEBUG")]
    pub debug: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a MaxMind license key is required (--license or GEOIP_LICENSE) unless --database-path is set")]
    MissingLicense,

    #[error("route prefix must not be empty")]
    EmptyRoutePrefix,

    #[error("route prefix must start with '/': {0}")]
    RelativeRoutePrefix(String),

    #[error("update interval must be at least one hour")]
    ZeroUpdateInterval,

    #[error("fetch timeout must be greater than zero")]
    ZeroFetchTimeout,

    #[error("edition must not be empty")]
    EmptyEdition,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Data source
    pub license_key: Option<String>,
    pub account_id: String,
    pub edition: String,
    pub database_path: Option<String>,
    pub update_url: String,

    // HTTP surface
    pub listen_addr: String,
    pub route_prefix: String,
    pub allowed_origins: Vec<String>,

    // Refresh
    pub update_interval: Duration,
    pub fetch_timeout: Duration,
    pub refresh_jitter: Duration,

    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            license_key: None,
            account_id: "0".to_string(),
            edition: "GeoLite2-City".to_string(),
            database_path: None,
            update_url: crate::adapters::outbound::DEFAULT_UPDATE_URL.to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
            route_prefix: "/geoip".to_string(),
            allowed_origins: Vec::new(),
            update_interval: Duration::from_secs(24 * 3600),
            fetch_timeout: Duration::from_secs(300),
            refresh_jitter: Duration::ZERO,
            debug: false,
        }
    }
}

impl Config {
    /// Check the configuration is usable before anything is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.route_prefix.is_empty() {
            return Err(ConfigError::EmptyRoutePrefix);
        }
        if !self.route_prefix.starts_with('/') {
            return Err(ConfigError::RelativeRoutePrefix(self.route_prefix.clone()));
        }
        if self.edition.trim().is_empty() {
            return Err(ConfigError::EmptyEdition);
        }
        if self.update_interval.is_zero() {
            return Err(ConfigError::ZeroUpdateInterval);
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroFetchTimeout);
        }
        let has_license = self
            .license_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !has_license && !self.uses_local_database() {
            return Err(ConfigError::MissingLicense);
        }
        Ok(())
    }

    /// Whether the database comes from a local file rather than MaxMind.
    pub fn uses_local_database(&self) -> bool {
        self.database_path.is_some()
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            license_key: cli.license,
            account_id: cli.account_id,
            edition: cli.edition,
            database_path: cli.database_path,
            update_url: cli.update_url,
            listen_addr: format!("{}:{}", cli.bind_ip, cli.port),
            route_prefix: cli.route_prefix,
            allowed_origins: cli
                .allowed_origins
                .into_iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            update_interval: Duration::from_secs(cli.update_interval.saturating_mul(3600)),
            fetch_timeout: Duration::from_secs(cli.fetch_timeout_secs),
            refresh_jitter: Duration::from_secs(cli.refresh_jitter_secs),
            debug: cli.debug,
        }
    }
}

/// Build the configuration from an explicit argument list.
pub fn config_from_args<I, T>(args: I) -> anyhow::Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let config = Config::from(cli);
    config.validate()?;
    Ok(config)
}

/// Parse the process arguments and environment into a validated `Config`.
///
/// `--help` and `--version` print and exit here.
#[cfg_attr(coverage_nightly, coverage(off))]
pub fn load_config() -> anyhow::Result<Config> {
    let config = Config::from(Cli::parse());
    config.validate()?;
    Ok(config)
}
