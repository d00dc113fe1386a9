//! Shared data models spanning the engine layers.

pub mod account;
pub mod decision;
pub mod indicators;
pub mod market;
pub mod report;
pub mod signal;

pub use account::{
    split_symbol, Balance, OrderRef, OrderSide, Position, TradeRecord, TradeStats,
};
pub use decision::{FusedDecision, LlmDecision, RiskLevel, TradeAction};
pub use indicators::{
    IndicatorState, MacdIndicator, RsiIndicator, Trend, TrendDirection, TrendStrength,
};
pub use market::{Candle, MarketSnapshot, OhlcvSeries, SeriesError};
pub use report::{CycleOutcome, CycleReport};
pub use signal::{SignalIndicator, SignalStrength, SuggestedAction, TechnicalSignal};
