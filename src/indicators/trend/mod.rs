//! Trend classification from RSI and MACD

use crate::models::indicators::{
    MacdIndicator, RsiIndicator, Trend, TrendDirection, TrendStrength,
};

pub const BULLISH_RSI: f64 = 60.0;
pub const BEARISH_RSI: f64 = 40.0;

/// Direction comes from RSI alone; MACD histogram vs. signal line decides strength.
pub fn classify_trend(rsi: &RsiIndicator, macd: &MacdIndicator) -> Trend {
    let direction = if rsi.value > BULLISH_RSI {
        TrendDirection::Bullish
    } else if rsi.value < BEARISH_RSI {
        TrendDirection::Bearish
    } else {
        TrendDirection::Neutral
    };

    let strength = if macd.histogram.abs() > 0.5 * macd.signal.abs() {
        TrendStrength::Strong
    } else {
        TrendStrength::Weak
    };

    Trend {
        direction,
        strength,
        description: format!("{} {} trend", strength, direction),
    }
}
