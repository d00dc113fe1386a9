//! Indicator engine: RSI + MACD over an OHLCV series, plus derived signals.

use serde::{Deserialize, Serialize};

use crate::indicators::error::IndicatorError;
use crate::indicators::momentum::{macd, rsi};
use crate::indicators::trend::classify_trend;
use crate::models::indicators::IndicatorState;
use crate::models::market::OhlcvSeries;
use crate::models::signal::TechnicalSignal;
use crate::signals::technical::derive_signals;

/// Longest indicator window; shorter series are rejected.
pub const MIN_CANDLES: usize = macd::DEFAULT_SLOW_PERIOD as usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorAnalysis {
    pub state: IndicatorState,
    pub signals: Vec<TechnicalSignal>,
}

pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Compute indicator state and technical signals from the series tail.
    pub fn compute(series: &OhlcvSeries) -> Result<IndicatorAnalysis, IndicatorError> {
        let candles = series.candles();
        if candles.len() < MIN_CANDLES {
            return Err(IndicatorError::InsufficientHistory {
                required: MIN_CANDLES,
                actual: candles.len(),
            });
        }

        let insufficient = || IndicatorError::InsufficientHistory {
            required: MIN_CANDLES,
            actual: candles.len(),
        };
        let rsi = rsi::calculate_rsi_default(candles).ok_or_else(insufficient)?;
        let macd = macd::calculate_macd_default(candles).ok_or_else(insufficient)?;

        if !rsi.value.is_finite() {
            return Err(IndicatorError::NonFinite { indicator: "RSI" });
        }
        if !(macd.macd.is_finite() && macd.signal.is_finite() && macd.histogram.is_finite()) {
            return Err(IndicatorError::NonFinite { indicator: "MACD" });
        }

        let trend = classify_trend(&rsi, &macd);
        let signals = derive_signals(&rsi, &macd);

        Ok(IndicatorAnalysis {
            state: IndicatorState::from_parts(&rsi, &macd, trend),
            signals,
        })
    }
}
