use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_PRICE_FEED_URL: &str = "https://api.coingecko.com/api/v3/coins/helium";

/// Which cache store backs the cache-aside accessor
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    Memcached,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub cache_backend: CacheBackend,
    pub memcached_addr: String,
    pub memory_cache_capacity: NonZeroUsize,
    pub cache_io_timeout: Duration,
    pub clear_cache_on_start: bool,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub price_feed_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("POSTGRES_URL"))
            .map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", "50")?;

        let cache_backend = match std::env::var("CACHE_BACKEND")
            .unwrap_or_else(|_| "memcached".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "memcached" => CacheBackend::Memcached,
            "memory" => CacheBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "CACHE_BACKEND",
                    reason: format!("unknown backend {other:?}"),
                })
            }
        };

        let memcached_addr =
            std::env::var("MEMCACHED_ADDR").unwrap_or_else(|_| "127.0.0.1:11211".into());

        let memory_cache_capacity = parse_var("MEMORY_CACHE_CAPACITY", "10000")?;

        let cache_io_timeout = Duration::from_millis(parse_var("CACHE_IO_TIMEOUT_MS", "500")?);

        // CLEARMEMCACHED is the older spelling of the same switch
        let clear_cache_on_start = ["CLEAR_CACHE", "CLEARMEMCACHED"]
            .iter()
            .any(|name| std::env::var(name).map(|v| v == "true").unwrap_or(false));

        let bind_addr = parse_var("BIND_ADDR", "0.0.0.0")?;
        let port = parse_var("PORT", "1122")?;

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let request_timeout = Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", "30")?);

        let price_feed_url =
            std::env::var("PRICE_FEED_URL").unwrap_or_else(|_| DEFAULT_PRICE_FEED_URL.into());

        Ok(Self {
            database_url,
            db_max_connections,
            cache_backend,
            memcached_addr,
            memory_cache_capacity,
            cache_io_timeout,
            clear_cache_on_start,
            bind_addr,
            port,
            cors_allowed_origins,
            request_timeout,
            price_feed_url,
        })
    }
}

fn parse_var<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
}
