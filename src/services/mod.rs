//! External collaborators: market data, exchange and LLM advisor.

pub mod binance;
pub mod exchange;
pub mod llm;
pub mod market_data;
pub mod paper;

pub use exchange::{ExchangeClient, ExchangeError, TradeLedger};
pub use llm::{LlmAdvisor, LlmError, LlmProvider};
pub use market_data::{MarketDataError, MarketDataProvider};
pub use paper::PaperExchange;
