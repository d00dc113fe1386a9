//! Discrete technical signals emitted by the indicator engine.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalIndicator {
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
}

impl fmt::Display for SignalIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalIndicator::Rsi => write!(f, "RSI"),
            SignalIndicator::Macd => write!(f, "MACD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Weak,
    Medium,
    Strong,
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStrength::Weak => write!(f, "weak"),
            SignalStrength::Medium => write!(f, "medium"),
            SignalStrength::Strong => write!(f, "strong"),
        }
    }
}

/// What a technical signal suggests. Never an order by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    ConsiderBuy,
    ConsiderSell,
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestedAction::ConsiderBuy => write!(f, "consider_buy"),
            SuggestedAction::ConsiderSell => write!(f, "consider_sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalSignal {
    pub indicator: SignalIndicator,
    pub signal: String,
    pub strength: SignalStrength,
    pub action: SuggestedAction,
}

impl TechnicalSignal {
    pub fn new(
        indicator: SignalIndicator,
        signal: impl Into<String>,
        strength: SignalStrength,
        action: SuggestedAction,
    ) -> Self {
        Self {
            indicator,
            signal: signal.into(),
            strength,
            action,
        }
    }
}
