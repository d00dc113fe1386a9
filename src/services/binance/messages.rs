//! Binance spot REST payloads.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::market::Candle;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hr {
    pub symbol: String,
    pub last_price: String,
    pub bid_price: String,
    pub ask_price: String,
    pub quote_volume: String,
    pub close_time: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: i64,
    pub status: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub executed_qty: Option<String>,
    #[serde(default)]
    pub cummulative_quote_qty: Option<String>,
    pub transact_time: i64,
}

impl OrderResponse {
    /// Average fill price, falling back to the limit price for unfilled orders.
    pub fn average_price(&self) -> Option<f64> {
        let executed = parse_opt(self.executed_qty.as_deref())?;
        let quote = parse_opt(self.cummulative_quote_qty.as_deref());
        match quote {
            Some(quote) if executed > 0.0 => Some(quote / executed),
            _ => parse_opt(self.price.as_deref()).filter(|p| *p > 0.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub balances: Vec<AssetBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

fn parse_opt(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.parse().ok())
}

pub fn parse_decimal(field: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|_| format!("{} is not a number: {:?}", field, value))
}

pub fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>, String> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| format!("invalid timestamp {}", ms))
}

/// Kline rows are positional arrays:
/// `[open_time, open, high, low, close, volume, close_time, ...]`.
pub fn parse_kline(row: &[Value]) -> Result<Candle, String> {
    if row.len() < 6 {
        return Err(format!("kline row has {} fields, expected at least 6", row.len()));
    }
    let open_time = row[0]
        .as_i64()
        .ok_or_else(|| "kline open time is not an integer".to_string())?;

    let field = |idx: usize, name: &str| -> Result<f64, String> {
        match &row[idx] {
            Value::String(s) => parse_decimal(name, s),
            Value::Number(n) => n.as_f64().ok_or_else(|| format!("{} out of range", name)),
            other => Err(format!("{} has unexpected type: {}", name, other)),
        }
    };

    Ok(Candle::new(
        field(1, "open")?,
        field(2, "high")?,
        field(3, "low")?,
        field(4, "close")?,
        field(5, "volume")?,
        millis_to_datetime(open_time)?,
    ))
}
