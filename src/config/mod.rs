//! Environment-driven configuration, loaded once at startup and immutable after.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::binance::{LIVE_BASE_URL, TESTNET_BASE_URL};
use crate::services::llm::LlmProvider;
use crate::signals::engine::MIN_CANDLES;
use crate::strategies::parser::AmountBounds;

pub const MIN_INTERVAL_SECS: u64 = 5;
pub const MAX_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid amount bounds: min {min}, max {max}")]
    InvalidBounds { min: f64, max: f64 },

    #[error("missing required setting {0}")]
    MissingKey(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Paper,
    Testnet,
    Live,
}

impl FromStr for ExecutionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paper" => Ok(ExecutionMode::Paper),
            "testnet" => Ok(ExecutionMode::Testnet),
            "live" => Ok(ExecutionMode::Live),
            _ => Err(()),
        }
    }
}

#[derive(Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Clone)]
pub struct ExchangeSettings {
    pub mode: ExecutionMode,
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub base_url: Option<String>,
    pub paper_base_balance: f64,
    pub paper_quote_balance: f64,
}

impl ExchangeSettings {
    /// Explicit override, else the endpoint matching the mode. Paper mode
    /// reads public market data from the live endpoint.
    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.mode) {
            (Some(url), _) => url,
            (None, ExecutionMode::Testnet) => TESTNET_BASE_URL,
            (None, _) => LIVE_BASE_URL,
        }
    }
}

impl std::fmt::Debug for ExchangeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeSettings")
            .field("mode", &self.mode)
            .field("has_credentials", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .field("paper_base_balance", &self.paper_base_balance)
            .field("paper_quote_balance", &self.paper_quote_balance)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TradingConfig {
    pub environment: String,
    pub symbol: String,
    pub interval: Duration,
    pub bounds: AmountBounds,
    pub timeframe: String,
    pub ohlcv_limit: usize,
    pub call_timeout: Duration,
    pub llm: LlmSettings,
    pub exchange: ExchangeSettings,
    /// 0 disables the status server.
    pub status_port: u16,
}

impl TradingConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let interval_secs: u64 = parse_or(&get, "TRADING_INTERVAL", 60)?;
        if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&interval_secs) {
            return Err(ConfigError::OutOfRange {
                key: "TRADING_INTERVAL",
                value: interval_secs as f64,
                min: MIN_INTERVAL_SECS as f64,
                max: MAX_INTERVAL_SECS as f64,
            });
        }

        let min_amount: f64 = parse_or(&get, "MIN_AMOUNT", 0.001)?;
        let max_amount: f64 = parse_or(&get, "MAX_AMOUNT", 1.0)?;
        let bounds = AmountBounds::new(min_amount, max_amount).ok_or(ConfigError::InvalidBounds {
            min: min_amount,
            max: max_amount,
        })?;

        let ohlcv_limit: usize = parse_or(&get, "OHLCV_LIMIT", 100)?;
        if ohlcv_limit < MIN_CANDLES || ohlcv_limit > 1000 {
            return Err(ConfigError::OutOfRange {
                key: "OHLCV_LIMIT",
                value: ohlcv_limit as f64,
                min: MIN_CANDLES as f64,
                max: 1000.0,
            });
        }

        let call_timeout_secs: u64 = parse_or(&get, "CALL_TIMEOUT_SECONDS", 30)?;
        if call_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "CALL_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        let symbol = get("TRADING_SYMBOL").unwrap_or_else(|| "BTC/USDT".to_string());
        if crate::models::account::split_symbol(&symbol).is_none() {
            return Err(ConfigError::Invalid {
                key: "TRADING_SYMBOL",
                value: symbol,
            });
        }

        let provider = match get("LLM_PROVIDER") {
            Some(raw) => raw.parse::<LlmProvider>().map_err(|_| ConfigError::Invalid {
                key: "LLM_PROVIDER",
                value: raw,
            })?,
            None => LlmProvider::Groq,
        };
        let key_env = provider.profile().api_key_env;
        let api_key = get(key_env).ok_or(ConfigError::MissingKey(key_env))?;

        let llm = LlmSettings {
            provider,
            api_key,
            model: get("LLM_MODEL"),
            base_url: get("LLM_BASE_URL"),
            temperature: parse_or(&get, "LLM_TEMPERATURE", 0.7)?,
            max_tokens: parse_or(&get, "LLM_MAX_TOKENS", 500)?,
        };

        let mode = match get("TRADING_MODE") {
            Some(raw) => raw.parse::<ExecutionMode>().map_err(|_| ConfigError::Invalid {
                key: "TRADING_MODE",
                value: raw,
            })?,
            None => ExecutionMode::Paper,
        };
        let exchange = ExchangeSettings {
            mode,
            api_key: get("BINANCE_API_KEY"),
            secret_key: get("BINANCE_SECRET_KEY"),
            base_url: get("BINANCE_BASE_URL"),
            paper_base_balance: parse_or(&get, "PAPER_BASE_BALANCE", 0.0)?,
            paper_quote_balance: parse_or(&get, "PAPER_QUOTE_BALANCE", 10_000.0)?,
        };
        if mode != ExecutionMode::Paper {
            if exchange.api_key.is_none() {
                return Err(ConfigError::MissingKey("BINANCE_API_KEY"));
            }
            if exchange.secret_key.is_none() {
                return Err(ConfigError::MissingKey("BINANCE_SECRET_KEY"));
            }
        }

        Ok(Self {
            environment: get("ENVIRONMENT").unwrap_or_else(|| "sandbox".to_string()),
            symbol,
            interval: Duration::from_secs(interval_secs),
            bounds,
            timeframe: get("OHLCV_TIMEFRAME").unwrap_or_else(|| "1h".to_string()),
            ohlcv_limit,
            call_timeout: Duration::from_secs(call_timeout_secs),
            llm,
            exchange,
            status_port: parse_or(&get, "STATUS_PORT", 8080)?,
        })
    }

    /// Base asset of the configured pair (`BTC` for `BTC/USDT`).
    pub fn base_asset(&self) -> &str {
        crate::models::account::split_symbol(&self.symbol)
            .map(|(base, _)| base)
            .unwrap_or(&self.symbol)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
