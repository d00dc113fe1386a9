//! MACD (Moving Average Convergence Divergence) indicator

use crate::common::math;
use crate::models::indicators::MacdIndicator;
use crate::models::market::Candle;

pub const DEFAULT_FAST_PERIOD: u32 = 12;
pub const DEFAULT_SLOW_PERIOD: u32 = 26;
pub const DEFAULT_SIGNAL_PERIOD: u32 = 9;

/// Calculate MACD indicator
///
/// MACD = EMA(12) - EMA(26)
/// Signal = EMA(9) of MACD
/// Histogram = MACD - Signal
///
/// The MACD line exists from the `slow_period`-th candle onward; the signal
/// line is seeded from the first MACD value, so `slow_period` candles are
/// enough for a defined result.
pub fn calculate_macd(
    candles: &[Candle],
    fast_period: u32,
    slow_period: u32,
    signal_period: u32,
) -> Option<MacdIndicator> {
    if fast_period == 0 || signal_period == 0 || fast_period >= slow_period {
        return None;
    }
    if candles.len() < slow_period as usize {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let fast_ema = math::ema_series(&closes, fast_period as usize);
    let slow_ema = math::ema_series(&closes, slow_period as usize);

    let macd_values: Vec<f64> = (slow_period as usize - 1..closes.len())
        .map(|i| fast_ema[i] - slow_ema[i])
        .collect();

    let macd_line = *macd_values.last()?;
    let signal_line = math::ema(&macd_values, signal_period as usize)?;
    let histogram = macd_line - signal_line;

    Some(MacdIndicator {
        macd: macd_line,
        signal: signal_line,
        histogram,
        period: Some((fast_period, slow_period, signal_period)),
    })
}

/// Calculate MACD with default periods (12, 26, 9)
pub fn calculate_macd_default(candles: &[Candle]) -> Option<MacdIndicator> {
    calculate_macd(
        candles,
        DEFAULT_FAST_PERIOD,
        DEFAULT_SLOW_PERIOD,
        DEFAULT_SIGNAL_PERIOD,
    )
}
