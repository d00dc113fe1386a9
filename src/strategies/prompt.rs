//! Deterministic advisor prompts built from one cycle's market state.

use crate::models::market::MarketSnapshot;
use crate::signals::engine::IndicatorAnalysis;
use crate::strategies::parser::AmountBounds;

const SYSTEM_PROMPT: &str = "You are a cryptocurrency trading expert. \
Give one short-term spot trading decision based only on the data provided. \
Answer with exactly these lines:\n\
ACTION: BUY | SELL | HOLD\n\
AMOUNT: <quantity in base asset, 0 for HOLD>\n\
RISK: LOW | MEDIUM | HIGH\n\
REASON: <one sentence>";

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    bounds: AmountBounds,
}

impl PromptBuilder {
    pub fn new(bounds: AmountBounds) -> Self {
        Self { bounds }
    }

    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    pub fn user_prompt(&self, snapshot: &MarketSnapshot, analysis: &IndicatorAnalysis) -> String {
        let state = &analysis.state;
        let signals = if analysis.signals.is_empty() {
            "- none".to_string()
        } else {
            analysis
                .signals
                .iter()
                .map(|s| format!("- {}: {} ({}, {})", s.indicator, s.signal, s.strength, s.action))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "Market: {symbol}\n\
             - Price: {price:.2}\n\
             - Bid: {bid:.2}\n\
             - Ask: {ask:.2}\n\
             - Volume: {volume:.2}\n\
             \n\
             Technical analysis:\n\
             - RSI(14): {rsi:.2}\n\
             - MACD(12,26,9): {macd:.4}\n\
             - MACD signal: {macd_signal:.4}\n\
             - MACD histogram: {macd_hist:.4}\n\
             - Trend: {trend}\n\
             \n\
             Signals:\n\
             {signals}\n\
             \n\
             Order size must be between {min} and {max} {base}.",
            symbol = snapshot.symbol,
            price = snapshot.price,
            bid = snapshot.bid,
            ask = snapshot.ask,
            volume = snapshot.volume,
            rsi = state.rsi,
            macd = state.macd,
            macd_signal = state.macd_signal,
            macd_hist = state.macd_hist,
            trend = state.trend.description,
            signals = signals,
            min = self.bounds.min,
            max = self.bounds.max,
            base = base_asset(&snapshot.symbol),
        )
    }
}

fn base_asset(symbol: &str) -> &str {
    crate::models::account::split_symbol(symbol)
        .map(|(base, _)| base)
        .unwrap_or(symbol)
}
