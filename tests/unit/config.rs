//! Unit tests for environment configuration

use std::collections::HashMap;
use std::time::Duration;

use tradefuse::config::{ConfigError, ExecutionMode, TradingConfig};
use tradefuse::services::binance::{LIVE_BASE_URL, TESTNET_BASE_URL};
use tradefuse::services::llm::LlmProvider;

fn load(pairs: &[(&str, &str)]) -> Result<TradingConfig, ConfigError> {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    TradingConfig::from_source(|key| env.get(key).cloned())
}

#[test]
fn test_defaults() {
    let config = load(&[("GROQ_API_KEY", "gsk-test")]).unwrap();

    assert_eq!(config.symbol, "BTC/USDT");
    assert_eq!(config.base_asset(), "BTC");
    assert_eq!(config.interval, Duration::from_secs(60));
    assert_eq!(config.bounds.min, 0.001);
    assert_eq!(config.bounds.max, 1.0);
    assert_eq!(config.timeframe, "1h");
    assert_eq!(config.ohlcv_limit, 100);
    assert_eq!(config.call_timeout, Duration::from_secs(30));
    assert_eq!(config.status_port, 8080);
    assert_eq!(config.llm.provider, LlmProvider::Groq);
    assert_eq!(config.llm.api_key, "gsk-test");
    assert_eq!(config.exchange.mode, ExecutionMode::Paper);
    assert_eq!(config.exchange.base_url(), LIVE_BASE_URL);
}

#[test]
fn test_overrides() {
    let config = load(&[
        ("LLM_PROVIDER", "openai"),
        ("OPENAI_API_KEY", "sk-test"),
        ("LLM_MODEL", "gpt-4o"),
        ("TRADING_SYMBOL", "ETH/USDT"),
        ("TRADING_INTERVAL", "5"),
        ("MIN_AMOUNT", "0.01"),
        ("MAX_AMOUNT", "0.5"),
        ("OHLCV_TIMEFRAME", "15m"),
        ("STATUS_PORT", "0"),
    ])
    .unwrap();

    assert_eq!(config.llm.provider, LlmProvider::OpenAi);
    assert_eq!(config.llm.model.as_deref(), Some("gpt-4o"));
    assert_eq!(config.base_asset(), "ETH");
    assert_eq!(config.interval, Duration::from_secs(5));
    assert_eq!(config.bounds.min, 0.01);
    assert_eq!(config.timeframe, "15m");
    assert_eq!(config.status_port, 0);
}

#[test]
fn test_blank_values_fall_back_to_defaults() {
    let config = load(&[("GROQ_API_KEY", "gsk-test"), ("TRADING_INTERVAL", "  ")]).unwrap();
    assert_eq!(config.interval, Duration::from_secs(60));
}

#[test]
fn test_interval_out_of_range() {
    for raw in ["4", "301"] {
        let err = load(&[("GROQ_API_KEY", "k"), ("TRADING_INTERVAL", raw)]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                key: "TRADING_INTERVAL",
                ..
            }
        ));
    }
    assert!(load(&[("GROQ_API_KEY", "k"), ("TRADING_INTERVAL", "300")]).is_ok());
}

#[test]
fn test_unparseable_value() {
    let err = load(&[("GROQ_API_KEY", "k"), ("TRADING_INTERVAL", "soon")]).unwrap_err();
    assert_eq!(
        err,
        ConfigError::Invalid {
            key: "TRADING_INTERVAL",
            value: "soon".to_string()
        }
    );
}

#[test]
fn test_invalid_amount_bounds() {
    let err = load(&[
        ("GROQ_API_KEY", "k"),
        ("MIN_AMOUNT", "2"),
        ("MAX_AMOUNT", "1"),
    ])
    .unwrap_err();
    assert_eq!(err, ConfigError::InvalidBounds { min: 2.0, max: 1.0 });

    let err = load(&[("GROQ_API_KEY", "k"), ("MIN_AMOUNT", "0")]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBounds { .. }));
}

#[test]
fn test_ohlcv_limit_must_cover_indicators() {
    let err = load(&[("GROQ_API_KEY", "k"), ("OHLCV_LIMIT", "20")]).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::OutOfRange {
            key: "OHLCV_LIMIT",
            ..
        }
    ));
}

#[test]
fn test_zero_timeout_rejected() {
    let err = load(&[("GROQ_API_KEY", "k"), ("CALL_TIMEOUT_SECONDS", "0")]).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            key: "CALL_TIMEOUT_SECONDS",
            ..
        }
    ));
}

#[test]
fn test_symbol_needs_quote() {
    let err = load(&[("GROQ_API_KEY", "k"), ("TRADING_SYMBOL", "BTCUSDT")]).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            key: "TRADING_SYMBOL",
            ..
        }
    ));
}

#[test]
fn test_missing_provider_key() {
    assert_eq!(
        load(&[]).unwrap_err(),
        ConfigError::MissingKey("GROQ_API_KEY")
    );
    assert_eq!(
        load(&[("LLM_PROVIDER", "openai"), ("GROQ_API_KEY", "k")]).unwrap_err(),
        ConfigError::MissingKey("OPENAI_API_KEY")
    );
}

#[test]
fn test_unknown_provider() {
    let err = load(&[("LLM_PROVIDER", "carrier-pigeon")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "LLM_PROVIDER", .. }));
}

#[test]
fn test_live_mode_requires_exchange_keys() {
    let err = load(&[("GROQ_API_KEY", "k"), ("TRADING_MODE", "live")]).unwrap_err();
    assert_eq!(err, ConfigError::MissingKey("BINANCE_API_KEY"));

    let err = load(&[
        ("GROQ_API_KEY", "k"),
        ("TRADING_MODE", "testnet"),
        ("BINANCE_API_KEY", "api"),
    ])
    .unwrap_err();
    assert_eq!(err, ConfigError::MissingKey("BINANCE_SECRET_KEY"));
}

#[test]
fn test_testnet_endpoint() {
    let config = load(&[
        ("GROQ_API_KEY", "k"),
        ("TRADING_MODE", "testnet"),
        ("BINANCE_API_KEY", "api"),
        ("BINANCE_SECRET_KEY", "secret"),
    ])
    .unwrap();
    assert_eq!(config.exchange.mode, ExecutionMode::Testnet);
    assert_eq!(config.exchange.base_url(), TESTNET_BASE_URL);

    let overridden = load(&[
        ("GROQ_API_KEY", "k"),
        ("BINANCE_BASE_URL", "http://127.0.0.1:9000"),
    ])
    .unwrap();
    assert_eq!(overridden.exchange.base_url(), "http://127.0.0.1:9000");
}

#[test]
fn test_debug_redacts_secrets() {
    let config = load(&[
        ("GROQ_API_KEY", "gsk-very-secret"),
        ("TRADING_MODE", "live"),
        ("BINANCE_API_KEY", "binance-key-secret"),
        ("BINANCE_SECRET_KEY", "binance-secret"),
    ])
    .unwrap();
    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("gsk-very-secret"));
    assert!(!rendered.contains("binance-key-secret"));
    assert!(!rendered.contains("binance-secret"));
}
