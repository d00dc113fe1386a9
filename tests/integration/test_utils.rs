#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::time::Instant;
use tradefuse::core::coordinator::{CoordinatorSettings, ExecutionCoordinator};
use tradefuse::metrics::Metrics;
use tradefuse::models::account::{OrderRef, OrderSide, Position, TradeStats};
use tradefuse::models::market::{Candle, MarketSnapshot};
use tradefuse::services::exchange::{ExchangeClient, ExchangeError};
use tradefuse::services::llm::{LlmAdvisor, LlmError};
use tradefuse::services::market_data::{MarketDataError, MarketDataProvider};
use tradefuse::strategies::parser::{AmountBounds, KeywordStrategyParser};
use tradefuse::strategies::prompt::PromptBuilder;

pub const SYMBOL: &str = "BTC/USDT";

/// Hourly candles closing at the given prices.
pub fn candles(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            Candle::new(
                close,
                close + 1.0,
                close - 1.0,
                close,
                25.0,
                start + chrono::Duration::hours(i as i64),
            )
        })
        .collect()
}

/// Alternating moves starting at 1000: `down` on even steps, `up` on odd ones.
pub fn zigzag(count: usize, down: f64, up: f64) -> Vec<f64> {
    let mut closes = vec![1000.0];
    for i in 0..count - 1 {
        let last = closes[i];
        closes.push(if i % 2 == 0 { last + down } else { last + up });
    }
    closes
}

/// RSI ~59 with MACD above its signal: a lone `consider_buy`.
pub fn buy_signal_candles() -> Vec<Candle> {
    candles(&zigzag(60, 2.0, -1.5))
}

/// RSI ~41 with MACD below its signal: a lone `consider_sell`.
pub fn sell_signal_candles() -> Vec<Candle> {
    candles(&zigzag(60, -2.0, 1.5))
}

pub fn flat_candles(count: usize) -> Vec<Candle> {
    candles(&vec![1000.0; count])
}

/// Market data that serves fixed candles, optionally failing the first
/// `failures` snapshot calls. Records when each snapshot was requested.
pub struct ScriptedMarket {
    candles: Vec<Candle>,
    failures: AtomicUsize,
    error: MarketDataError,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedMarket {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            failures: AtomicUsize::new(0),
            error: MarketDataError::Network("connection refused".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(candles: Vec<Candle>, failures: usize, error: MarketDataError) -> Self {
        Self {
            candles,
            failures: AtomicUsize::new(failures),
            error,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedMarket {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        self.calls.lock().unwrap().push(Instant::now());

        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(self.error.clone());
        }

        let price = self.candles.last().map(|c| c.close).unwrap_or(1000.0);
        Ok(MarketSnapshot {
            timestamp: Utc::now(),
            symbol: symbol.to_string(),
            price,
            bid: price - 0.5,
            ask: price + 0.5,
            volume: 1234.0,
        })
    }

    async fn fetch_ohlcv(
        &self,
        _symbol: &str,
        _timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let skip = self.candles.len().saturating_sub(limit);
        Ok(self.candles[skip..].to_vec())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub amount: f64,
    pub price: Option<f64>,
}

/// Exchange that remembers every order and optionally rejects them all.
#[derive(Default)]
pub struct RecordingExchange {
    orders: Mutex<Vec<PlacedOrder>>,
    reject_with: Option<ExchangeError>,
}

impl RecordingExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(error: ExchangeError) -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            reject_with: Some(error),
        }
    }

    pub fn orders(&self) -> Vec<PlacedOrder> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeClient for RecordingExchange {
    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        price: Option<f64>,
    ) -> Result<OrderRef, ExchangeError> {
        self.orders.lock().unwrap().push(PlacedOrder {
            symbol: symbol.to_string(),
            side,
            amount,
            price,
        });
        if let Some(err) = &self.reject_with {
            return Err(err.clone());
        }
        Ok(OrderRef {
            id: format!("test-{}", self.orders.lock().unwrap().len()),
            symbol: symbol.to_string(),
            side,
            amount,
            price,
            status: "FILLED".to_string(),
            timestamp: Utc::now(),
        })
    }

    async fn get_position(&self, _symbol: &str) -> Result<Position, ExchangeError> {
        if let Some(err) = &self.reject_with {
            return Err(err.clone());
        }
        Ok(Position::default())
    }

    async fn get_trade_stats(&self) -> Result<TradeStats, ExchangeError> {
        Ok(TradeStats {
            total_trades: self.orders.lock().unwrap().len() as u64,
            ..TradeStats::default()
        })
    }
}

enum Reply {
    Text(String),
    Fail(LlmError),
    Stall(Duration),
}

/// Advisor with a canned reply. Keeps the user prompts it was sent.
pub struct ScriptedAdvisor {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAdvisor {
    pub fn replying(text: &str) -> Self {
        Self::with(Reply::Text(text.to_string()))
    }

    pub fn failing(error: LlmError) -> Self {
        Self::with(Reply::Fail(error))
    }

    pub fn stalling(delay: Duration) -> Self {
        Self::with(Reply::Stall(delay))
    }

    fn with(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmAdvisor for ScriptedAdvisor {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(user.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(err) => Err(err.clone()),
            Reply::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("buy 0.5 BTC".to_string())
            }
        }
    }
}

pub struct Harness {
    pub coordinator: Arc<ExecutionCoordinator>,
    pub market: Arc<ScriptedMarket>,
    pub exchange: Arc<RecordingExchange>,
    pub advisor: Arc<ScriptedAdvisor>,
    pub metrics: Arc<Metrics>,
}

pub fn harness(market: ScriptedMarket, exchange: RecordingExchange, advisor: ScriptedAdvisor) -> Harness {
    let market = Arc::new(market);
    let exchange = Arc::new(exchange);
    let advisor = Arc::new(advisor);
    let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
    let bounds = AmountBounds::new(0.001, 1.0).expect("valid bounds");

    let coordinator = Arc::new(ExecutionCoordinator::new(
        market.clone(),
        exchange.clone(),
        advisor.clone(),
        Arc::new(KeywordStrategyParser::new(bounds, "BTC")),
        PromptBuilder::new(bounds),
        metrics.clone(),
        CoordinatorSettings {
            symbol: SYMBOL.to_string(),
            timeframe: "1h".to_string(),
            ohlcv_limit: 100,
            call_timeout: Duration::from_secs(2),
        },
    ));

    Harness {
        coordinator,
        market,
        exchange,
        advisor,
        metrics,
    }
}
