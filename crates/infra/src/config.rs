//! Process configuration read from the environment.
//!
//! Every variable has a default except `DATABASE_URL`, which is required
//! only for the postgres backend.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use pricedb_core::{DomainError, Money, MoneyParseError};
use pricedb_inventory::Item;

use crate::retry::Retrier;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_COLLECTION: &str = "items";
pub const DEFAULT_SEED: &str = "shoes=50,socks=5";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl fmt::Display) -> Self {
        Self::Invalid {
            var,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            other => Err(format!("unknown backend {other:?} (expected memory or postgres)")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => f.write_str("memory"),
            BackendKind::Postgres => f.write_str("postgres"),
        }
    }
}

/// Storage backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub database_url: Option<String>,
    pub collection: String,
    pub connect_max_attempts: u32,
    pub connect_interval: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub read_retry_attempts: u32,
    pub seed: Vec<Item>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            database_url: None,
            collection: DEFAULT_COLLECTION.to_string(),
            connect_max_attempts: 4,
            connect_interval: Duration::from_millis(1000),
            connect_timeout: Duration::from_secs(100),
            request_timeout: Duration::from_millis(5000),
            read_retry_attempts: 1,
            // The default seed is static and valid.
            seed: parse_seed(DEFAULT_SEED).unwrap_or_default(),
        }
    }
}

impl StoreConfig {
    /// Retrier for start-up connection attempts.
    pub fn connect_retrier(&self) -> Retrier {
        Retrier::fixed(self.connect_max_attempts, self.connect_interval)
    }

    /// Retrier for reads, or `None` when reads run once.
    pub fn read_retrier(&self) -> Option<Retrier> {
        (self.read_retry_attempts > 1).then(|| {
            Retrier::fixed(self.read_retry_attempts, Duration::from_millis(50))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset,
    /// except `PRICEDB_SEED` where empty disables seeding.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = StoreConfig::default();

        let bind_addr = parse_or("PRICEDB_BIND_ADDR", get("PRICEDB_BIND_ADDR"), || {
            DEFAULT_BIND_ADDR.parse().map_err(|e| ConfigError::invalid("PRICEDB_BIND_ADDR", e))
        })?;

        let backend = match get("PRICEDB_BACKEND") {
            Some(v) => v
                .parse::<BackendKind>()
                .map_err(|e| ConfigError::invalid("PRICEDB_BACKEND", e))?,
            None => defaults.backend,
        };

        let database_url = get("DATABASE_URL");
        if backend == BackendKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let connect_max_attempts = parse_or(
            "PRICEDB_CONNECT_MAX_ATTEMPTS",
            get("PRICEDB_CONNECT_MAX_ATTEMPTS"),
            || Ok(defaults.connect_max_attempts),
        )?;
        if connect_max_attempts == 0 {
            return Err(ConfigError::invalid("PRICEDB_CONNECT_MAX_ATTEMPTS", "must be at least 1"));
        }

        let read_retry_attempts = parse_or(
            "PRICEDB_READ_RETRY_ATTEMPTS",
            get("PRICEDB_READ_RETRY_ATTEMPTS"),
            || Ok(defaults.read_retry_attempts),
        )?;
        if read_retry_attempts == 0 {
            return Err(ConfigError::invalid("PRICEDB_READ_RETRY_ATTEMPTS", "must be at least 1"));
        }

        let connect_interval = Duration::from_millis(parse_or(
            "PRICEDB_CONNECT_INTERVAL_MS",
            get("PRICEDB_CONNECT_INTERVAL_MS"),
            || Ok(defaults.connect_interval.as_millis() as u64),
        )?);
        let connect_timeout = Duration::from_secs(parse_or(
            "PRICEDB_CONNECT_TIMEOUT_SECS",
            get("PRICEDB_CONNECT_TIMEOUT_SECS"),
            || Ok(defaults.connect_timeout.as_secs()),
        )?);
        let request_timeout_ms: u64 = parse_or(
            "PRICEDB_REQUEST_TIMEOUT_MS",
            get("PRICEDB_REQUEST_TIMEOUT_MS"),
            || Ok(defaults.request_timeout.as_millis() as u64),
        )?;
        if request_timeout_ms == 0 {
            return Err(ConfigError::invalid("PRICEDB_REQUEST_TIMEOUT_MS", "must be positive"));
        }

        let seed = match lookup("PRICEDB_SEED") {
            Some(raw) => parse_seed(&raw).map_err(|e| ConfigError::invalid("PRICEDB_SEED", e))?,
            None => defaults.seed,
        };

        Ok(Self {
            bind_addr,
            store: StoreConfig {
                backend,
                database_url,
                collection: get("PRICEDB_COLLECTION").unwrap_or(defaults.collection),
                connect_max_attempts,
                connect_interval,
                connect_timeout,
                request_timeout: Duration::from_millis(request_timeout_ms),
                read_retry_attempts,
                seed,
            },
        })
    }
}

fn parse_or<T>(
    var: &'static str,
    raw: Option<String>,
    default: impl FnOnce() -> Result<T, ConfigError>,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        Some(v) => v.trim().parse().map_err(|e| ConfigError::invalid(var, e)),
        None => default(),
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("entry {0:?} is not of the form name=price")]
    Malformed(String),

    #[error("entry {entry:?}: {source}")]
    Price {
        entry: String,
        source: MoneyParseError,
    },

    #[error("entry {entry:?}: {source}")]
    Item { entry: String, source: DomainError },
}

/// Parse `name=price` pairs separated by commas. Blank input yields no items.
pub fn parse_seed(raw: &str) -> Result<Vec<Item>, SeedError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, price) = entry
                .split_once('=')
                .ok_or_else(|| SeedError::Malformed(entry.to_string()))?;
            let price = Money::parse(price.trim()).map_err(|source| SeedError::Price {
                entry: entry.to_string(),
                source,
            })?;
            Item::new(name.trim(), price).map_err(|source| SeedError::Item {
                entry: entry.to_string(),
                source,
            })
        })
        .collect()
}
