//! Per-cycle summary emitted by the execution loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::account::OrderRef;
use crate::models::decision::LlmDecision;
use crate::models::indicators::IndicatorState;
use crate::models::signal::TechnicalSignal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// An approved order was placed.
    Executed { order: OrderRef },
    /// Observed, no action.
    Observed,
    /// Data problem; the cycle stopped early and waits the normal interval.
    Skipped { reason: String },
    /// Collaborator or exchange failure; the loop backs off before retrying.
    Failed { error: String },
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Executed { .. } => "executed",
            CycleOutcome::Observed => "observed",
            CycleOutcome::Skipped { .. } => "skipped",
            CycleOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorState>,
    #[serde(default)]
    pub signals: Vec<TechnicalSignal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<LlmDecision>,
    pub approved: bool,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub fn new(symbol: impl Into<String>, outcome: CycleOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            symbol: symbol.into(),
            price: None,
            indicators: None,
            signals: Vec::new(),
            advice: None,
            decision: None,
            approved: false,
            outcome,
        }
    }

    pub fn failed(symbol: impl Into<String>, error: impl ToString) -> Self {
        Self::new(
            symbol,
            CycleOutcome::Failed {
                error: error.to_string(),
            },
        )
    }
}
