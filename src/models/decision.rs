//! Advisor decisions and the fused, gated result.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::account::OrderSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    /// Order side for directional actions; `None` for hold.
    pub fn side(self) -> Option<OrderSide> {
        match self {
            TradeAction::Buy => Some(OrderSide::Buy),
            TradeAction::Sell => Some(OrderSide::Sell),
            TradeAction::Hold => None,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Hold => write!(f, "hold"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Structured form of the advisor's free-text reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmDecision {
    pub action: TradeAction,
    pub amount: f64,
    pub reason: String,
    pub risk_level: RiskLevel,
}

impl LlmDecision {
    /// Fail-safe decision used whenever no confident action can be extracted.
    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Hold,
            amount: 0.0,
            reason: reason.into(),
            risk_level: RiskLevel::Medium,
        }
    }
}

/// The only value allowed to trigger an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedDecision {
    pub action: TradeAction,
    pub amount: f64,
    pub approved: bool,
}
