//! Exchange client interface and the in-memory trade ledger shared by adapters.

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::account::{OrderRef, OrderSide, Position, TradeRecord, TradeStats};
use crate::services::market_data::MarketDataError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExchangeError {
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("order rejected ({code:?}): {message}")]
    Rejected { code: Option<i64>, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("missing exchange credentials")]
    MissingCredentials,
}

impl From<MarketDataError> for ExchangeError {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::Network(message) => ExchangeError::Network(message),
            MarketDataError::Timeout { timeout_ms } => {
                ExchangeError::Network(format!("timed out after {}ms", timeout_ms))
            }
            MarketDataError::RateLimited { retry_after_ms } => {
                ExchangeError::RateLimited { retry_after_ms }
            }
            MarketDataError::Api { status, message } => ExchangeError::Rejected {
                code: Some(status as i64),
                message,
            },
            MarketDataError::InvalidResponse(message) => ExchangeError::InvalidResponse(message),
        }
    }
}

#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Market order when `price` is `None`, limit order otherwise.
    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        price: Option<f64>,
    ) -> Result<OrderRef, ExchangeError>;

    async fn get_position(&self, symbol: &str) -> Result<Position, ExchangeError>;

    async fn get_trade_stats(&self) -> Result<TradeStats, ExchangeError>;
}

/// Order attempts seen by this process. Not persisted across restarts.
#[derive(Debug, Default)]
pub struct TradeLedger {
    records: RwLock<Vec<TradeRecord>>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_fill(&self, order: &OrderRef) {
        self.records.write().await.push(TradeRecord {
            timestamp: order.timestamp,
            symbol: order.symbol.clone(),
            side: order.side,
            amount: order.amount,
            price: order.price,
            accepted: true,
        });
    }

    pub async fn record_rejection(&self, symbol: &str, side: OrderSide, amount: f64, price: Option<f64>) {
        self.records.write().await.push(TradeRecord {
            timestamp: Utc::now(),
            symbol: symbol.to_string(),
            side,
            amount,
            price,
            accepted: false,
        });
    }

    pub async fn records(&self) -> Vec<TradeRecord> {
        self.records.read().await.clone()
    }

    pub async fn stats(&self) -> TradeStats {
        summarize(&self.records.read().await)
    }
}

/// Counts cover every attempt; volume and size only accepted fills.
pub fn summarize(records: &[TradeRecord]) -> TradeStats {
    let total_trades = records.len() as u64;
    let buy_trades = records.iter().filter(|r| r.side == OrderSide::Buy).count() as u64;
    let sell_trades = total_trades - buy_trades;

    let accepted: Vec<&TradeRecord> = records.iter().filter(|r| r.accepted).collect();
    let success_rate = if total_trades == 0 {
        0.0
    } else {
        accepted.len() as f64 / total_trades as f64 * 100.0
    };
    let total_volume = accepted
        .iter()
        .map(|r| r.amount * r.price.unwrap_or(0.0))
        .sum();
    let avg_trade_size = if accepted.is_empty() {
        0.0
    } else {
        accepted.iter().map(|r| r.amount).sum::<f64>() / accepted.len() as f64
    };

    TradeStats {
        total_trades,
        buy_trades,
        sell_trades,
        success_rate,
        total_volume,
        avg_trade_size,
    }
}
