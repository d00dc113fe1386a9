//! Simulated exchange: fills at the provider's last price against in-memory balances.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::account::{split_symbol, Balance, OrderRef, OrderSide, Position, TradeStats};
use crate::services::exchange::{ExchangeClient, ExchangeError, TradeLedger};
use crate::services::market_data::MarketDataProvider;

pub struct PaperExchange {
    market: Arc<dyn MarketDataProvider>,
    balances: Mutex<HashMap<String, f64>>,
    ledger: TradeLedger,
    next_id: AtomicU64,
}

impl PaperExchange {
    /// Seeds balances for the base and quote asset of `symbol`.
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        symbol: &str,
        base_balance: f64,
        quote_balance: f64,
    ) -> Self {
        let mut balances = HashMap::new();
        if let Some((base, quote)) = split_symbol(symbol) {
            balances.insert(base.to_string(), base_balance);
            balances.insert(quote.to_string(), quote_balance);
        }

        Self {
            market,
            balances: Mutex::new(balances),
            ledger: TradeLedger::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    async fn reject(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        price: Option<f64>,
        err: ExchangeError,
    ) -> Result<OrderRef, ExchangeError> {
        self.ledger.record_rejection(symbol, side, amount, price).await;
        Err(err)
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        price: Option<f64>,
    ) -> Result<OrderRef, ExchangeError> {
        let Some((base, quote)) = split_symbol(symbol) else {
            return Err(ExchangeError::Rejected {
                code: None,
                message: format!("unsupported symbol {}", symbol),
            });
        };

        if !(amount.is_finite() && amount > 0.0) {
            let err = ExchangeError::Rejected {
                code: None,
                message: format!("invalid amount {}", amount),
            };
            return self.reject(symbol, side, amount, price, err).await;
        }

        let fill_price = match price {
            Some(limit) => limit,
            None => self.market.fetch_snapshot(symbol).await?.price,
        };
        let notional = amount * fill_price;

        let mut balances = self.balances.lock().await;
        let base_free = balances.get(base).copied().unwrap_or(0.0);
        let quote_free = balances.get(quote).copied().unwrap_or(0.0);

        match side {
            OrderSide::Buy if quote_free < notional => {
                drop(balances);
                let err = ExchangeError::InsufficientBalance(format!(
                    "need {:.2} {}, have {:.2}",
                    notional, quote, quote_free
                ));
                return self.reject(symbol, side, amount, Some(fill_price), err).await;
            }
            OrderSide::Sell if base_free < amount => {
                drop(balances);
                let err = ExchangeError::InsufficientBalance(format!(
                    "need {} {}, have {}",
                    amount, base, base_free
                ));
                return self.reject(symbol, side, amount, Some(fill_price), err).await;
            }
            OrderSide::Buy => {
                balances.insert(base.to_string(), base_free + amount);
                balances.insert(quote.to_string(), quote_free - notional);
            }
            OrderSide::Sell => {
                balances.insert(base.to_string(), base_free - amount);
                balances.insert(quote.to_string(), quote_free + notional);
            }
        }
        drop(balances);

        let order = OrderRef {
            id: format!("paper-{}", self.next_id.fetch_add(1, Ordering::Relaxed)),
            symbol: symbol.to_string(),
            side,
            amount,
            price: Some(fill_price),
            status: "FILLED".to_string(),
            timestamp: Utc::now(),
        };
        self.ledger.record_fill(&order).await;

        info!(
            order_id = %order.id,
            symbol = %symbol,
            side = %side,
            amount = amount,
            price = fill_price,
            "Paper order filled"
        );
        Ok(order)
    }

    async fn get_position(&self, symbol: &str) -> Result<Position, ExchangeError> {
        let (base, quote) = split_symbol(symbol).ok_or_else(|| ExchangeError::Rejected {
            code: None,
            message: format!("unsupported symbol {}", symbol),
        })?;
        let balances = self.balances.lock().await;
        debug!(symbol = %symbol, "Reading paper position");

        Ok(Position {
            base: Balance::new(balances.get(base).copied().unwrap_or(0.0), 0.0),
            quote: Balance::new(balances.get(quote).copied().unwrap_or(0.0), 0.0),
        })
    }

    async fn get_trade_stats(&self) -> Result<TradeStats, ExchangeError> {
        Ok(self.ledger.stats().await)
    }
}
