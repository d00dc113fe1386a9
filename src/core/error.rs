use thiserror::Error;

use crate::services::exchange::ExchangeError;
use crate::services::llm::LlmError;
use crate::services::market_data::MarketDataError;

/// Failure that ends a cycle early and sends the loop into error backoff.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CycleError {
    #[error("market data unavailable: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("order execution failed: {0}")]
    Execution(#[from] ExchangeError),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to build llm advisor: {0}")]
    Llm(#[from] LlmError),

    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("status server error: {0}")]
    Io(#[from] std::io::Error),
}
