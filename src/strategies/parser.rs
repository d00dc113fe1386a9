//! Free-text advisor reply -> structured decision.
//!
//! Keyword/regex matching behind the [`StrategyParser`] trait. Parsing never
//! fails: anything that does not yield a confident direction becomes hold.

use once_cell::sync::Lazy;
use regex::{Match, Regex};
use serde::{Deserialize, Serialize};

use crate::models::decision::{LlmDecision, RiskLevel, TradeAction};

const MAX_REASON_CHARS: usize = 200;
const AMOUNT_SEARCH_WINDOW: usize = 40;
const NEGATION_LOOKBACK: usize = 16;
const INDICATOR_LOOKBACK_WORDS: usize = 3;

const INDICATOR_NAMES: &[&str] = &["rsi", "macd", "ema", "sma", "adx", "atr"];

static ACTION_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[\s*_#>\-]*action[\s*_]*[:=][\s*_]*(buy|sell|hold)\b").unwrap()
});

static AMOUNT_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[\s*_#>\-]*(?:amount|quantity|qty)[\s*_]*[:=][\s*_]*([0-9]+(?:\.[0-9]+)?)")
        .unwrap()
});

static RISK_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[\s*_#>\-]*risk(?:[ _]level)?[\s*_]*[:=][\s*_]*(low|medium|high)\b").unwrap()
});

static REASON_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[\s*_#>\-]*reason[\s*_]*[:=][\s*_]*(.+)$").unwrap()
});

static RISK_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(low|high)[\s\-]risk\b|(저위험|고위험)").unwrap());

// English keywords need word boundaries; Korean ones are matched as-is since
// they are usually followed by a verb suffix (매수합니다).
static KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(buying|buy|purchase|accumulate|selling|sell|take\s+profit|holding|hold|wait)\b|(매수|매도|관망|보유|홀드)",
    )
    .unwrap()
});

static QUANTITY_WITH_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*([A-Za-z]{2,10})\b").unwrap());

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap());

const NEGATIONS: &[&str] = &[
    "don't", "dont", "do not", "not", "never", "avoid", "no", "won't", "shouldn't", "should not",
];

/// Inclusive order-quantity bounds, in base-asset units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountBounds {
    pub min: f64,
    pub max: f64,
}

impl AmountBounds {
    /// `None` unless `0 < min <= max` and both are finite.
    pub fn new(min: f64, max: f64) -> Option<Self> {
        if min.is_finite() && max.is_finite() && min > 0.0 && min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    pub fn clamp(&self, amount: f64) -> f64 {
        if !amount.is_finite() {
            return self.min;
        }
        amount.clamp(self.min, self.max)
    }
}

impl Default for AmountBounds {
    fn default() -> Self {
        Self {
            min: 0.001,
            max: 1.0,
        }
    }
}

pub trait StrategyParser: Send + Sync {
    fn parse(&self, text: &str) -> LlmDecision;
}

#[derive(Debug, Clone)]
pub struct KeywordStrategyParser {
    bounds: AmountBounds,
    base_asset: String,
}

struct KeywordHit {
    action: TradeAction,
    end: usize,
}

impl KeywordStrategyParser {
    pub fn new(bounds: AmountBounds, base_asset: impl Into<String>) -> Self {
        Self {
            bounds,
            base_asset: base_asset.into(),
        }
    }

    fn keyword_action(keyword: &str) -> TradeAction {
        let lower = keyword.to_lowercase();
        match lower.as_str() {
            "buy" | "buying" | "purchase" | "accumulate" | "매수" => TradeAction::Buy,
            k if k == "sell" || k == "selling" || k == "매도" || k.starts_with("take") => {
                TradeAction::Sell
            }
            _ => TradeAction::Hold,
        }
    }

    fn is_negated(text: &str, start: usize) -> bool {
        let prefix = &text[..start];
        let from = prefix
            .char_indices()
            .rev()
            .nth(NEGATION_LOOKBACK - 1)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let window = prefix[from..].trim_end().to_lowercase();
        NEGATIONS.iter().any(|negation| {
            window.ends_with(negation) && {
                let before = &window[..window.len() - negation.len()];
                before.is_empty() || !before.ends_with(|c: char| c.is_alphanumeric())
            }
        })
    }

    fn keyword_hits(text: &str) -> Vec<KeywordHit> {
        KEYWORD
            .find_iter(text)
            .filter_map(|m| {
                let action = Self::keyword_action(m.as_str());
                let negated = Self::is_negated(text, m.start());
                match (action, negated) {
                    // "don't wait" says nothing about direction
                    (TradeAction::Hold, true) => None,
                    (_, true) => Some(KeywordHit {
                        action: TradeAction::Hold,
                        end: m.end(),
                    }),
                    (action, false) => Some(KeywordHit {
                        action,
                        end: m.end(),
                    }),
                }
            })
            .collect()
    }

    /// Explicit field first, then keyword scan. Returns the action and the
    /// byte offset after the keyword that decided it, if any.
    fn extract_action(text: &str) -> Option<(TradeAction, Option<usize>)> {
        if let Some(caps) = ACTION_FIELD.captures(text) {
            let action = Self::keyword_action(&caps[1]);
            return Some((action, caps.get(1).map(|m| m.end())));
        }

        let hits = Self::keyword_hits(text);
        let first = hits.first()?;
        let has_buy = hits.iter().any(|h| h.action == TradeAction::Buy);
        let has_sell = hits.iter().any(|h| h.action == TradeAction::Sell);
        if has_buy && has_sell {
            return Some((TradeAction::Hold, None));
        }
        Some((first.action, Some(first.end)))
    }

    /// Quantity for a directional decision. Only the sentence holding the
    /// deciding keyword is searched; indicator readings, prices and
    /// percentages never count as a quantity.
    fn extract_amount(&self, text: &str, keyword_end: Option<usize>) -> Option<f64> {
        if let Some(caps) = AMOUNT_FIELD.captures(text) {
            return caps[1].parse().ok();
        }

        let keyword_end = keyword_end?;
        let (start, end) = sentence_around(text, keyword_end);
        let sentence = &text[start..end];

        let with_unit = QUANTITY_WITH_UNIT.captures_iter(sentence).find(|caps| {
            caps[2].eq_ignore_ascii_case(&self.base_asset)
                && caps
                    .get(1)
                    .is_some_and(|m| is_plain_quantity(sentence, &m))
        });
        if let Some(caps) = with_unit {
            return caps[1].parse().ok();
        }

        let tail = &text[keyword_end..end];
        let window_end = tail
            .char_indices()
            .nth(AMOUNT_SEARCH_WINDOW)
            .map(|(idx, _)| idx)
            .unwrap_or(tail.len());
        let window = &tail[..window_end];

        NUMBER
            .find_iter(window)
            .find(|m| is_plain_quantity(window, m))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn extract_risk(text: &str) -> RiskLevel {
        let level = RISK_FIELD
            .captures(text)
            .map(|caps| caps[1].to_lowercase())
            .or_else(|| {
                RISK_PHRASE.captures(text).map(|caps| match caps.get(2) {
                    Some(korean) if korean.as_str() == "저위험" => "low".to_string(),
                    Some(_) => "high".to_string(),
                    None => caps[1].to_lowercase(),
                })
            });

        match level.as_deref() {
            Some("low") => RiskLevel::Low,
            Some("high") => RiskLevel::High,
            _ => RiskLevel::Medium,
        }
    }

    fn extract_reason(text: &str) -> String {
        let reason = REASON_FIELD
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
            .or_else(|| {
                text.lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "no advice received".to_string());

        reason.chars().take(MAX_REASON_CHARS).collect()
    }
}

impl StrategyParser for KeywordStrategyParser {
    fn parse(&self, text: &str) -> LlmDecision {
        let reason = Self::extract_reason(text);
        let risk_level = Self::extract_risk(text);

        let (action, keyword_end) = match Self::extract_action(text) {
            Some((TradeAction::Hold, _)) | None => {
                return LlmDecision {
                    risk_level,
                    ..LlmDecision::hold(reason)
                }
            }
            Some(found) => found,
        };

        let raw = self
            .extract_amount(text, keyword_end)
            .unwrap_or(self.bounds.min);

        LlmDecision {
            action,
            amount: self.bounds.clamp(raw),
            reason,
            risk_level,
        }
    }
}

/// Line breaks and sentence punctuation; a `.` only counts when followed by
/// whitespace or the end of the text, so decimals stay intact.
fn is_sentence_break(text: &str, idx: usize, c: char) -> bool {
    match c {
        '\n' | '!' | '?' | ';' => true,
        '.' => text[idx + 1..].chars().next().map_or(true, char::is_whitespace),
        _ => false,
    }
}

/// Byte range of the sentence containing `pos`.
fn sentence_around(text: &str, pos: usize) -> (usize, usize) {
    let start = text[..pos]
        .char_indices()
        .rev()
        .find(|&(idx, c)| is_sentence_break(text, idx, c))
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0);
    let end = text[pos..]
        .char_indices()
        .find(|&(idx, c)| is_sentence_break(text, pos + idx, c))
        .map(|(idx, _)| pos + idx)
        .unwrap_or(text.len());
    (start, end)
}

fn is_plain_quantity(text: &str, number: &Match<'_>) -> bool {
    !is_price(text, number) && !is_percentage(text, number) && !is_indicator_reading(text, number)
}

fn is_price(text: &str, number: &Match<'_>) -> bool {
    let before = text[..number.start()].trim_end();
    before.ends_with('$') || before.ends_with(',')
}

fn is_percentage(text: &str, number: &Match<'_>) -> bool {
    text[number.end()..].trim_start().starts_with('%')
}

/// `RSI 28`, `RSI at 28`, `RSI(14) is 71`, `MACD: -12`.
fn is_indicator_reading(text: &str, number: &Match<'_>) -> bool {
    text[..number.start()]
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .rev()
        .take(INDICATOR_LOOKBACK_WORDS)
        .any(|word| {
            INDICATOR_NAMES
                .iter()
                .any(|name| word.eq_ignore_ascii_case(name))
        })
}
