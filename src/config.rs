use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Base URLs of the upstream services.
#[derive(Clone, Debug)]
pub struct Endpoints {
    /// May contain a `{locale}` placeholder.
    pub encyclopedia: String,
    pub dictionary: String,
    pub quotes: String,
    pub board: String,
    pub color: String,
}

impl Endpoints {
    pub fn encyclopedia_for(&self, locale: &str) -> String {
        self.encyclopedia
            .replace("{locale}", locale)
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            encyclopedia: "https://{locale}.wikipedia.org".to_string(),
            dictionary: "https://api.dictionaryapi.dev".to_string(),
            quotes: "https://en.wikiquote.org".to_string(),
            board: "https://api.are.na".to_string(),
            color: "https://api.color.pizza".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Deadlines {
    pub summary_fetch: Duration,
    pub default_fetch: Duration,
    pub summary_fanout: Duration,
    pub image_fanout: Duration,
    pub board_fanout: Duration,
    pub request: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            summary_fetch: Duration::from_secs(8),
            default_fetch: Duration::from_secs(5),
            summary_fanout: Duration::from_secs(5),
            image_fanout: Duration::from_secs(4),
            board_fanout: Duration::from_secs(5),
            request: Duration::from_secs(90),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Limits {
    pub similar_colors: usize,
    pub disambiguation: usize,
    pub images: usize,
    pub board_page: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            similar_colors: 40,
            disambiguation: 5,
            images: 20,
            board_page: 20,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub locale: String,
    pub endpoints: Endpoints,
    pub deadlines: Deadlines,
    pub limits: Limits,
    pub cache_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = parse_var("PORT", 3000)?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            encyclopedia: env::var("ENCYCLOPEDIA_URL").unwrap_or(defaults.encyclopedia),
            dictionary: env::var("DICTIONARY_URL").unwrap_or(defaults.dictionary),
            quotes: env::var("QUOTES_URL").unwrap_or(defaults.quotes),
            board: env::var("BOARD_URL").unwrap_or(defaults.board),
            color: env::var("COLOR_URL").unwrap_or(defaults.color),
        };

        let limits = Limits {
            similar_colors: parse_var("SIMILAR_COLORS", Limits::default().similar_colors)?,
            ..Limits::default()
        };

        let sweep_secs = parse_var("CACHE_SWEEP_SECS", 5 * 60)?;
        let sweep_interval = positive_secs("CACHE_SWEEP_SECS", sweep_secs)?;

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            locale: env::var("LOCALE").unwrap_or_else(|_| "en".to_string()),
            endpoints,
            deadlines: Deadlines::default(),
            limits,
            cache_ttl: Duration::from_secs(parse_var("CACHE_TTL_SECS", 30 * 60)?),
            sweep_interval,
        })
    }

    /// Points every upstream at one base URL; used to run against a local mock.
    pub fn for_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Config {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            locale: "en".to_string(),
            endpoints: Endpoints {
                encyclopedia: base.clone(),
                dictionary: base.clone(),
                quotes: base.clone(),
                board: base.clone(),
                color: base,
            },
            deadlines: Deadlines::default(),
            limits: Limits::default(),
            cache_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", name, e))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(e.into()),
    }
}

fn positive_secs(name: &str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(AppError::ConfigError(format!("{} must be greater than zero", name)));
    }
    Ok(Duration::from_secs(secs))
}
