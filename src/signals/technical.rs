//! Discrete RSI / MACD signal rules.

use crate::models::indicators::{MacdIndicator, RsiIndicator};
use crate::models::signal::{SignalIndicator, SignalStrength, SuggestedAction, TechnicalSignal};

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

enum RsiAnalysis {
    Oversold,
    Overbought,
    Neutral,
}

enum MacdAnalysis {
    Uptrend,
    Downtrend,
    Neutral,
}

fn analyze_rsi(rsi: &RsiIndicator) -> RsiAnalysis {
    if rsi.value < RSI_OVERSOLD {
        RsiAnalysis::Oversold
    } else if rsi.value > RSI_OVERBOUGHT {
        RsiAnalysis::Overbought
    } else {
        RsiAnalysis::Neutral
    }
}

fn analyze_macd(macd: &MacdIndicator) -> MacdAnalysis {
    if macd.histogram > 0.0 && macd.macd > macd.signal {
        MacdAnalysis::Uptrend
    } else if macd.histogram < 0.0 && macd.macd < macd.signal {
        MacdAnalysis::Downtrend
    } else {
        MacdAnalysis::Neutral
    }
}

/// Evaluates each rule independently; zero, one or two signals come back.
pub fn derive_signals(rsi: &RsiIndicator, macd: &MacdIndicator) -> Vec<TechnicalSignal> {
    let mut signals = Vec::with_capacity(2);

    match analyze_rsi(rsi) {
        RsiAnalysis::Oversold => signals.push(TechnicalSignal::new(
            SignalIndicator::Rsi,
            "oversold",
            SignalStrength::Strong,
            SuggestedAction::ConsiderBuy,
        )),
        RsiAnalysis::Overbought => signals.push(TechnicalSignal::new(
            SignalIndicator::Rsi,
            "overbought",
            SignalStrength::Strong,
            SuggestedAction::ConsiderSell,
        )),
        RsiAnalysis::Neutral => {}
    }

    match analyze_macd(macd) {
        MacdAnalysis::Uptrend => signals.push(TechnicalSignal::new(
            SignalIndicator::Macd,
            "uptrend",
            SignalStrength::Medium,
            SuggestedAction::ConsiderBuy,
        )),
        MacdAnalysis::Downtrend => signals.push(TechnicalSignal::new(
            SignalIndicator::Macd,
            "downtrend",
            SignalStrength::Medium,
            SuggestedAction::ConsiderSell,
        )),
        MacdAnalysis::Neutral => {}
    }

    signals
}
