//! Cross-validation between the advisor decision and the technical signals.
//!
//! A two-source AND-gate: the advisor proposes, the technicals can veto.
//! Hold is never approved, so the loop never trades on technicals alone.

use crate::models::decision::{FusedDecision, LlmDecision, TradeAction};
use crate::models::signal::{SuggestedAction, TechnicalSignal};

pub fn validate(decision: &LlmDecision, technical: &[TechnicalSignal]) -> bool {
    let wanted = match decision.action {
        TradeAction::Hold => return false,
        TradeAction::Buy => SuggestedAction::ConsiderBuy,
        TradeAction::Sell => SuggestedAction::ConsiderSell,
    };

    if technical.is_empty() {
        return true;
    }

    // any single matching signal is enough, conflicting ones do not cancel it
    technical.iter().any(|signal| signal.action == wanted)
}

impl FusedDecision {
    pub fn fuse(decision: &LlmDecision, technical: &[TechnicalSignal]) -> Self {
        Self {
            action: decision.action,
            amount: decision.amount,
            approved: validate(decision, technical),
        }
    }
}
