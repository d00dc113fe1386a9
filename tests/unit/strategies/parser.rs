//! Unit tests for the free-text strategy parser

use tradefuse::models::decision::{RiskLevel, TradeAction};
use tradefuse::strategies::parser::{AmountBounds, KeywordStrategyParser, StrategyParser};

fn parser() -> KeywordStrategyParser {
    KeywordStrategyParser::new(AmountBounds::new(0.001, 1.0).unwrap(), "BTC")
}

#[test]
fn test_recommendation_with_quantity() {
    let decision = parser().parse("I recommend buying 0.01 BTC now");
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.amount, 0.01);
    assert_eq!(decision.risk_level, RiskLevel::Medium);
    assert_eq!(decision.reason, "I recommend buying 0.01 BTC now");
}

#[test]
fn test_hold_for_now() {
    let decision = parser().parse("hold for now");
    assert_eq!(decision.action, TradeAction::Hold);
    assert_eq!(decision.amount, 0.0);
}

#[test]
fn test_no_keyword_defaults_to_hold() {
    for text in [
        "",
        "   \n\n  ",
        "The market is interesting today.",
        "Volatility is elevated; 0.5 BTC moved on-chain.",
        "🤖 !!! ???",
    ] {
        let decision = parser().parse(text);
        assert_eq!(decision.action, TradeAction::Hold, "text: {:?}", text);
        assert_eq!(decision.amount, 0.0, "text: {:?}", text);
    }
}

#[test]
fn test_structured_reply() {
    let text = "ACTION: SELL\nAMOUNT: 0.25\nRISK: HIGH\nREASON: RSI is overbought and momentum is fading";
    let decision = parser().parse(text);
    assert_eq!(decision.action, TradeAction::Sell);
    assert_eq!(decision.amount, 0.25);
    assert_eq!(decision.risk_level, RiskLevel::High);
    assert_eq!(decision.reason, "RSI is overbought and momentum is fading");
}

#[test]
fn test_markdown_fields() {
    let text = "**ACTION:** buy\n**AMOUNT:** 0.05\n**RISK:** low\n**REASON:** oversold bounce";
    let decision = parser().parse(text);
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.amount, 0.05);
    assert_eq!(decision.risk_level, RiskLevel::Low);
}

#[test]
fn test_explicit_action_wins_over_keywords() {
    let text = "Some would sell here, but the setup favors patience.\nACTION: HOLD";
    let decision = parser().parse(text);
    assert_eq!(decision.action, TradeAction::Hold);
    assert_eq!(decision.amount, 0.0);
}

#[test]
fn test_case_insensitive_keywords() {
    assert_eq!(parser().parse("BUY 0.1 btc").action, TradeAction::Buy);
    assert_eq!(parser().parse("Time to Take Profit").action, TradeAction::Sell);
    assert_eq!(parser().parse("Accumulate slowly").action, TradeAction::Buy);
}

#[test]
fn test_korean_keywords() {
    let decision = parser().parse("지금 0.02 BTC 매수를 추천합니다");
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.amount, 0.02);

    assert_eq!(parser().parse("매도 시점입니다").action, TradeAction::Sell);
    assert_eq!(parser().parse("당분간 관망하세요").action, TradeAction::Hold);
}

#[test]
fn test_negated_keywords_hold() {
    assert_eq!(parser().parse("Don't buy yet").action, TradeAction::Hold);
    assert_eq!(parser().parse("avoid selling into this dip").action, TradeAction::Hold);
    assert_eq!(parser().parse("do not sell").action, TradeAction::Hold);
}

#[test]
fn test_conflicting_directions_hold() {
    let decision = parser().parse("You could buy the dip or sell the rip.");
    assert_eq!(decision.action, TradeAction::Hold);
    assert_eq!(decision.amount, 0.0);
}

#[test]
fn test_first_keyword_wins_against_hold() {
    assert_eq!(
        parser().parse("Buy 0.1 BTC and then hold it").action,
        TradeAction::Buy
    );
    assert_eq!(
        parser().parse("Wait for confirmation, then buy").action,
        TradeAction::Hold
    );
}

#[test]
fn test_amount_near_keyword_skips_prices_and_percentages() {
    let decision = parser().parse("Buy at $65,000 with 5% of the account: 0.3");
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.amount, 0.3);
}

#[test]
fn test_amount_far_from_keyword_is_ignored() {
    let decision = parser().parse("Buy now. The broader market context over the past week suggests 0.5");
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.amount, 0.001);
}

#[test]
fn test_directional_without_amount_uses_minimum() {
    let decision = parser().parse("Sell.");
    assert_eq!(decision.action, TradeAction::Sell);
    assert_eq!(decision.amount, 0.001);
}

#[test]
fn test_amount_is_clamped() {
    assert_eq!(parser().parse("buy 5 BTC").amount, 1.0);
    assert_eq!(parser().parse("buy 0.00001 BTC").amount, 0.001);
}

#[test]
fn test_clamp_is_idempotent() {
    let bounds = AmountBounds::new(0.001, 1.0).unwrap();
    for amount in [0.001, 0.01, 0.5, 1.0] {
        assert_eq!(bounds.clamp(amount), amount);
    }
    for amount in [-3.0, 0.0, 0.0001, 2.0, 1e9, f64::NAN] {
        let once = bounds.clamp(amount);
        assert_eq!(bounds.clamp(once), once);
        assert!((0.001..=1.0).contains(&once));
    }
}

#[test]
fn test_invalid_bounds() {
    assert!(AmountBounds::new(0.0, 1.0).is_none());
    assert!(AmountBounds::new(2.0, 1.0).is_none());
    assert!(AmountBounds::new(0.1, f64::INFINITY).is_none());
}

#[test]
fn test_risk_phrasing() {
    assert_eq!(parser().parse("buy, low risk entry").risk_level, RiskLevel::Low);
    assert_eq!(parser().parse("high-risk sell setup").risk_level, RiskLevel::High);
    assert_eq!(parser().parse("고위험 매수").risk_level, RiskLevel::High);
}

#[test]
fn test_reason_is_truncated() {
    let long = format!("hold {}", "x".repeat(500));
    let decision = parser().parse(&long);
    assert_eq!(decision.reason.chars().count(), 200);
}

#[test]
fn test_structured_reply_without_amount_uses_minimum() {
    let decision = parser().parse("ACTION: BUY\nRISK: LOW\nREASON: RSI at 28 is oversold");
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.amount, 0.001);
    assert_eq!(decision.risk_level, RiskLevel::Low);
}

#[test]
fn test_indicator_value_after_keyword_is_not_an_amount() {
    let decision = parser().parse("Buy: RSI 28 signals oversold");
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.amount, 0.001);

    let decision = parser().parse("Sell, MACD histogram at -40");
    assert_eq!(decision.action, TradeAction::Sell);
    assert_eq!(decision.amount, 0.001);
}

#[test]
fn test_quantity_in_another_sentence_is_ignored() {
    let decision = parser().parse("Buy now. Yesterday 500 BTC left exchanges.");
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.amount, 0.001);

    let decision = parser().parse("Sell\n2 BTC whales moved funds overnight");
    assert_eq!(decision.action, TradeAction::Sell);
    assert_eq!(decision.amount, 0.001);
}

#[test]
fn test_quantity_in_the_keyword_sentence_still_counts() {
    assert_eq!(parser().parse("Buy 0.05 BTC; RSI 28 is oversold").amount, 0.05);
    assert_eq!(parser().parse("ACTION: SELL 0.3\nREASON: RSI 75").amount, 0.3);
}

#[test]
fn test_hold_keeps_reason_and_risk() {
    let decision = parser().parse("ACTION: HOLD\nRISK: HIGH\nREASON: waiting for the breakout");
    assert_eq!(decision.action, TradeAction::Hold);
    assert_eq!(decision.amount, 0.0);
    assert_eq!(decision.risk_level, RiskLevel::High);
    assert_eq!(decision.reason, "waiting for the breakout");
}
