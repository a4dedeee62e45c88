//! Environment-driven configuration for the registry server.
//!
//! [`RegistryConfig::from_lookup`] holds all parsing so it can be exercised
//! without touching the process environment.

use crate::registry::{
    domain::{Principal, RegistryDomainError},
    services::{CapabilityProbe, NamespacePolicy},
};
use chrono::Duration;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

/// Development mode switch.
pub const DEV_MODE_VAR: &str = "REGISTRY_DEV_MODE";
/// `PostgreSQL` connection string.
pub const DATABASE_URL_VAR: &str = "REGISTRY_DATABASE_URL";
/// Connection pool size.
pub const DATABASE_POOL_SIZE_VAR: &str = "REGISTRY_DATABASE_POOL_SIZE";
/// Token signing secret.
pub const TOKEN_SECRET_VAR: &str = "REGISTRY_TOKEN_SECRET";
/// Mock principal used in development mode.
pub const MOCK_USER_VAR: &str = "REGISTRY_MOCK_USER";
/// Lifetime of issued tokens in seconds.
pub const TOKEN_TTL_VAR: &str = "REGISTRY_TOKEN_TTL_SECS";
/// Listen address.
pub const BIND_ADDR_VAR: &str = "REGISTRY_BIND_ADDR";
/// Text-search capability override.
pub const TEXT_SEARCH_VAR: &str = "REGISTRY_TEXT_SEARCH";
/// Tracing filter directive.
pub const LOG_VAR: &str = "REGISTRY_LOG";

const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_DEV_SECRET: &str = "dev-secret";
const DEFAULT_MOCK_USER: &str = "dev@kp.com";
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed.
    #[error("invalid value '{value}' for {variable}: {reason}")]
    Invalid {
        /// Variable name.
        variable: &'static str,
        /// Rejected value.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Production mode was requested without a signing secret.
    #[error("{TOKEN_SECRET_VAR} must be set outside development mode")]
    MissingSecret,

    /// A `.env` file exists but could not be read.
    #[error("failed to load .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}

/// Deployment mode selecting authentication and namespace policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Relaxed namespaces, mock identity and dev token endpoints.
    Development,
    /// Strict namespaces; tokens are minted elsewhere.
    Production,
}

/// Text-search capability setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSearchSetting {
    /// Probe the store on first use.
    Auto,
    /// Treat native text search as available without probing.
    Enabled,
    /// Always use the substring fallback.
    Disabled,
}

impl FromStr for TextSearchSetting {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            other => Err(format!("expected auto, enabled or disabled, got '{other}'")),
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Deployment mode.
    pub mode: DeploymentMode,
    /// `PostgreSQL` URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Connection pool size.
    pub database_pool_size: u32,
    /// HMAC signing secret for bearer tokens.
    pub token_secret: String,
    /// Principal used by the development token endpoints.
    pub mock_user: Principal,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Text-search capability setting.
    pub text_search: TextSearchSetting,
    /// Tracing filter directive.
    pub log_filter: String,
}

impl RegistryConfig {
    /// Loads configuration from the process environment, reading an optional
    /// `.env` file first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unreadable `.env` files or invalid values.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            return Err(err.into());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for invalid values or a missing production
    /// secret.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let dev_mode = read(DEV_MODE_VAR)
            .map(|value| parse_flag(DEV_MODE_VAR, &value))
            .transpose()?
            .unwrap_or(false);
        let mode = if dev_mode {
            DeploymentMode::Development
        } else {
            DeploymentMode::Production
        };

        let token_secret = match (read(TOKEN_SECRET_VAR), mode) {
            (Some(secret), _) => secret,
            (None, DeploymentMode::Development) => DEFAULT_DEV_SECRET.to_owned(),
            (None, DeploymentMode::Production) => return Err(ConfigError::MissingSecret),
        };

        let mock_user_value = read(MOCK_USER_VAR).unwrap_or_else(|| DEFAULT_MOCK_USER.to_owned());
        let mock_user = Principal::new(mock_user_value.clone())
            .map_err(|err: RegistryDomainError| invalid(MOCK_USER_VAR, &mock_user_value, err))?;

        let token_ttl_secs: i64 =
            parse_or(read(TOKEN_TTL_VAR), TOKEN_TTL_VAR, DEFAULT_TOKEN_TTL_SECS)?;
        if token_ttl_secs <= 0 {
            return Err(invalid(TOKEN_TTL_VAR, &token_ttl_secs.to_string(), "must be positive"));
        }
        let token_ttl = Duration::try_seconds(token_ttl_secs).ok_or_else(|| {
            invalid(TOKEN_TTL_VAR, &token_ttl_secs.to_string(), "out of range")
        })?;

        let database_pool_size: u32 =
            parse_or(read(DATABASE_POOL_SIZE_VAR), DATABASE_POOL_SIZE_VAR, DEFAULT_POOL_SIZE)?;
        if database_pool_size == 0 {
            return Err(invalid(DATABASE_POOL_SIZE_VAR, "0", "must be at least 1"));
        }

        let raw_bind_addr = read(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = raw_bind_addr
            .parse()
            .map_err(|err| invalid(BIND_ADDR_VAR, &raw_bind_addr, err))?;

        let text_search = read(TEXT_SEARCH_VAR)
            .map(|value| {
                value
                    .parse::<TextSearchSetting>()
                    .map_err(|reason| invalid(TEXT_SEARCH_VAR, &value, reason))
            })
            .transpose()?
            .unwrap_or(TextSearchSetting::Auto);

        let database_url = read(DATABASE_URL_VAR);
        if text_search == TextSearchSetting::Enabled && database_url.is_none() {
            return Err(invalid(
                TEXT_SEARCH_VAR,
                "enabled",
                format!("the in-memory catalog has no native text search; set {DATABASE_URL_VAR}"),
            ));
        }

        Ok(Self {
            mode,
            database_url,
            database_pool_size,
            token_secret,
            mock_user,
            token_ttl,
            bind_addr,
            text_search,
            log_filter: read(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned()),
        })
    }

    /// Returns whether development mode is active.
    #[must_use]
    pub const fn is_dev_mode(&self) -> bool {
        matches!(self.mode, DeploymentMode::Development)
    }

    /// Returns the publish policy for the deployment mode.
    #[must_use]
    pub fn namespace_policy(&self) -> NamespacePolicy {
        match self.mode {
            DeploymentMode::Development => NamespacePolicy::relaxed(),
            DeploymentMode::Production => NamespacePolicy::strict(),
        }
    }

    /// Returns a capability probe honouring the text-search setting.
    #[must_use]
    pub fn capability_probe(&self) -> CapabilityProbe {
        match self.text_search {
            TextSearchSetting::Auto => CapabilityProbe::new(),
            TextSearchSetting::Enabled => CapabilityProbe::preset(true),
            TextSearchSetting::Disabled => CapabilityProbe::preset(false),
        }
    }
}

fn invalid(variable: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        variable,
        value: value.to_owned(),
        reason: reason.to_string(),
    }
}

fn parse_flag(variable: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(variable, value, "expected a boolean")),
    }
}

fn parse_or<T>(value: Option<String>, variable: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|err| invalid(variable, &raw, err))
    })
}
