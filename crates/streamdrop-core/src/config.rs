//! Configuration module
//!
//! Runtime settings for the streaming server: bind address, public base URL used to
//! build links, storage root, expiry and sweep cadence, and ingestion limits.
//! Values come from the process environment (a `.env` file is honoured).

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const SERVER_PORT: u16 = 8080;
const SERVER_HOST: &str = "0.0.0.0";
const STORAGE_DIR: &str = "storage";
const EXPIRY_SECONDS: u64 = 24 * 60 * 60;
const SWEEP_INTERVAL_SECS: u64 = 60;
const MAX_INGEST_SIZE_MB: u64 = 2048;
const INGEST_TIMEOUT_SECS: u64 = 600;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Server configuration values
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_port: u16,
    pub host: String,
    /// Public origin used for `/watch` and `/stream` links, without trailing slash
    pub base_url: String,
    pub environment: String,
    pub storage_dir: PathBuf,
    /// Maximum lifetime of a registered file, measured from registration
    pub expiry: Duration,
    pub sweep_interval: Duration,
    pub max_ingest_size_bytes: u64,
    pub ingest_timeout: Duration,
    /// Allow URL ingestion from loopback/private addresses (local development and tests)
    pub allow_private_urls: bool,
    pub url_ingest_allowlist: Option<Vec<String>>,
    pub http_concurrency_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            host: SERVER_HOST.to_string(),
            base_url: format!("http://localhost:{}", SERVER_PORT),
            environment: "development".to_string(),
            storage_dir: PathBuf::from(STORAGE_DIR),
            expiry: Duration::from_secs(EXPIRY_SECONDS),
            sweep_interval: Duration::from_secs(SWEEP_INTERVAL_SECS),
            max_ingest_size_bytes: MAX_INGEST_SIZE_MB * 1024 * 1024,
            ingest_timeout: Duration::from_secs(INGEST_TIMEOUT_SECS),
            allow_private_urls: false,
            url_ingest_allowlist: None,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServerConfig>);

impl From<ServerConfig> for Config {
    fn from(config: ServerConfig) -> Self {
        Config(Box::new(config))
    }
}

impl Config {
    fn inner(&self) -> &ServerConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = ServerConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn host(&self) -> &str {
        &self.inner().host
    }

    pub fn base_url(&self) -> &str {
        &self.inner().base_url
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn storage_dir(&self) -> &Path {
        &self.inner().storage_dir
    }

    pub fn expiry(&self) -> Duration {
        self.inner().expiry
    }

    pub fn sweep_interval(&self) -> Duration {
        self.inner().sweep_interval
    }

    pub fn max_ingest_size_bytes(&self) -> u64 {
        self.inner().max_ingest_size_bytes
    }

    pub fn ingest_timeout(&self) -> Duration {
        self.inner().ingest_timeout
    }

    pub fn allow_private_urls(&self) -> bool {
        self.inner().allow_private_urls
    }

    pub fn url_ingest_allowlist(&self) -> Option<&[String]> {
        self.inner().url_ingest_allowlist.as_deref()
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().http_concurrency_limit
    }
}

impl ServerConfig {
    /// Build configuration from a key lookup, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let server_port: u16 = parse_or(&lookup, "PORT", SERVER_PORT)?;
        let host = lookup("HOST").unwrap_or(defaults.host);
        let base_url = lookup("BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", server_port));

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or(defaults.environment);

        let storage_dir = lookup("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);

        let expiry_secs: u64 = parse_or(&lookup, "EXPIRY_SECONDS", EXPIRY_SECONDS)?;
        let sweep_interval_secs: u64 =
            parse_or(&lookup, "SWEEP_INTERVAL_SECS", SWEEP_INTERVAL_SECS)?;
        let max_ingest_size_mb: u64 = parse_or(&lookup, "MAX_INGEST_SIZE_MB", MAX_INGEST_SIZE_MB)?;
        let ingest_timeout_secs: u64 =
            parse_or(&lookup, "INGEST_TIMEOUT_SECS", INGEST_TIMEOUT_SECS)?;
        let allow_private_urls: bool = parse_or(&lookup, "ALLOW_PRIVATE_URLS", false)?;
        let http_concurrency_limit: usize =
            parse_or(&lookup, "HTTP_CONCURRENCY_LIMIT", HTTP_CONCURRENCY_LIMIT)?;

        // Example: "cdn.example.com,videos.example.org"
        let url_ingest_allowlist = lookup("URL_INGEST_ALLOWLIST").and_then(|raw| {
            let domains: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            if domains.is_empty() {
                None
            } else {
                Some(domains)
            }
        });

        Ok(ServerConfig {
            server_port,
            host,
            base_url,
            environment,
            storage_dir,
            expiry: Duration::from_secs(expiry_secs),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            max_ingest_size_bytes: max_ingest_size_mb.saturating_mul(1024 * 1024),
            ingest_timeout: Duration::from_secs(ingest_timeout_secs),
            allow_private_urls,
            url_ingest_allowlist,
            http_concurrency_limit: http_concurrency_limit.max(1),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.expiry.is_zero() {
            return Err(anyhow::anyhow!("EXPIRY_SECONDS must be greater than zero"));
        }

        if self.sweep_interval.is_zero() {
            return Err(anyhow::anyhow!(
                "SWEEP_INTERVAL_SECS must be greater than zero"
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "BASE_URL must start with http:// or https://"
            ));
        }

        if self.storage_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_DIR must not be empty"));
        }

        if self.max_ingest_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_INGEST_SIZE_MB must be greater than zero"
            ));
        }

        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}
