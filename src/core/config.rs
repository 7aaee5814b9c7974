use super::cache::MAX_TTL_HOURS;
use super::context::AggregationOptions;
use super::models::Credentials;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const SECRET_ID_ENV: &str = "FINCTX_SECRET_ID";
pub const SECRET_KEY_ENV: &str = "FINCTX_SECRET_KEY";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox.belvo.com",
            Environment::Production => "https://api.belvo.com",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Overrides the environment's base URL.
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            environment: Environment::default(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Serialize, Clone, Default)]
pub struct CredentialsConfig {
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
}

fn default_ttl_hours() -> i64 {
    super::cache::DEFAULT_TTL_HOURS
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_hours: default_ttl_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AggregationConfig {
    #[serde(default = "default_transaction_months")]
    pub transaction_months: u32,
    #[serde(default)]
    pub include_recurring_expenses: bool,
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

fn default_transaction_months() -> u32 {
    3
}

fn default_currency() -> String {
    super::summary::DEFAULT_CURRENCY.to_string()
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            transaction_months: default_transaction_months(),
            include_recurring_expenses: false,
            default_currency: default_currency(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "finctx", "finctx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Rejects settings that would make the cache useless or overflow
    /// expiry timestamps.
    pub fn validate(&self) -> Result<()> {
        let ttl_hours = self.cache.ttl_hours;
        if !(1..=MAX_TTL_HOURS).contains(&ttl_hours) {
            bail!("cache.ttl_hours must be between 1 and {MAX_TTL_HOURS}, got {ttl_hours}");
        }
        Ok(())
    }

    /// Never panics, even for a config that skipped [`AppConfig::validate`].
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.cache.ttl_hours).unwrap_or(chrono::Duration::MAX)
    }

    pub fn aggregation_options(&self) -> AggregationOptions {
        AggregationOptions {
            transaction_months: self.aggregation.transaction_months,
            fetch_timeout: self.provider.timeout(),
            include_recurring_expenses: self.aggregation.include_recurring_expenses,
            default_currency: self.aggregation.default_currency.clone(),
        }
    }

    /// Credentials from the environment, falling back to the config file.
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    fn credentials_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
        let secret_id = env(SECRET_ID_ENV).or_else(|| self.credentials.secret_id.clone());
        let secret_key = env(SECRET_KEY_ENV).or_else(|| self.credentials.secret_key.clone());
        match (secret_id, secret_key) {
            (Some(id), Some(key)) => Credentials::new(id, key),
            _ => bail!(
                "Provider credentials missing: set {SECRET_ID_ENV} and {SECRET_KEY_ENV} \
                 or the credentials section of the config file"
            ),
        }
    }
}
