//! Binance spot REST client: public market data plus signed order/account calls.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, info, warn};

use super::messages::{
    millis_to_datetime, parse_decimal, parse_kline, AccountResponse, ApiErrorBody, OrderResponse,
    Ticker24hr,
};
use crate::models::account::{split_symbol, Balance, OrderRef, OrderSide, Position, TradeStats};
use crate::models::market::{Candle, MarketSnapshot};
use crate::services::exchange::{ExchangeClient, ExchangeError, TradeLedger};
use crate::services::market_data::{MarketDataError, MarketDataProvider};

pub const LIVE_BASE_URL: &str = "https://api.binance.com";
pub const TESTNET_BASE_URL: &str = "https://testnet.binance.vision";

const ENDPOINT_TICKER: &str = "/api/v3/ticker/24hr";
const ENDPOINT_KLINES: &str = "/api/v3/klines";
const ENDPOINT_ORDER: &str = "/api/v3/order";
const ENDPOINT_ACCOUNT: &str = "/api/v3/account";

const RECV_WINDOW_MS: u64 = 5000;
const RETRY_DELAY: Duration = Duration::from_millis(250);
const RETRY_TIMES: usize = 2;
const INSUFFICIENT_BALANCE_CODE: i64 = -2010;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Transport-level failure, mapped into the caller's error type.
#[derive(Debug, Clone)]
enum HttpFailure {
    Network { message: String, timeout: bool },
    RateLimited { retry_after_ms: Option<u64> },
    Api { status: u16, code: Option<i64>, message: String },
    Decode(String),
    MissingCredentials,
}

impl HttpFailure {
    fn is_transient(&self) -> bool {
        matches!(self, HttpFailure::Network { .. })
    }
}

impl From<reqwest::Error> for HttpFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return HttpFailure::Decode(err.to_string());
        }
        HttpFailure::Network {
            message: err.to_string(),
            timeout: err.is_timeout(),
        }
    }
}

impl From<HttpFailure> for MarketDataError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Network { message, .. } => MarketDataError::Network(message),
            HttpFailure::RateLimited { retry_after_ms } => {
                MarketDataError::RateLimited { retry_after_ms }
            }
            HttpFailure::Api { status, message, .. } => MarketDataError::Api { status, message },
            HttpFailure::Decode(message) => MarketDataError::InvalidResponse(message),
            HttpFailure::MissingCredentials => {
                MarketDataError::Api {
                    status: 401,
                    message: "missing credentials".to_string(),
                }
            }
        }
    }
}

impl From<HttpFailure> for ExchangeError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Network { message, .. } => ExchangeError::Network(message),
            HttpFailure::RateLimited { retry_after_ms } => {
                ExchangeError::RateLimited { retry_after_ms }
            }
            HttpFailure::Api { code, message, .. }
                if code == Some(INSUFFICIENT_BALANCE_CODE)
                    || message.to_lowercase().contains("insufficient balance") =>
            {
                ExchangeError::InsufficientBalance(message)
            }
            HttpFailure::Api { status, code, message } => ExchangeError::Rejected {
                code: code.or(Some(status as i64)),
                message,
            },
            HttpFailure::Decode(message) => ExchangeError::InvalidResponse(message),
            HttpFailure::MissingCredentials => ExchangeError::MissingCredentials,
        }
    }
}

/// `BTC/USDT` -> `BTCUSDT`
pub fn exchange_symbol(symbol: &str) -> String {
    symbol.replace('/', "").to_uppercase()
}

pub fn sign(secret: &str, query: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac key length is unrestricted"));
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub struct BinanceClient {
    http: Client,
    base_url: String,
    credentials: Option<Credentials>,
    ledger: TradeLedger,
}

impl BinanceClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            ledger: TradeLedger::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    async fn check_status(response: Response) -> Result<Response, HttpFailure> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|s| s * 1000);
            return Err(HttpFailure::RateLimited { retry_after_ms });
        }

        let body = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => HttpFailure::Api {
                status: status.as_u16(),
                code: Some(err.code),
                message: err.msg,
            },
            Err(_) => HttpFailure::Api {
                status: status.as_u16(),
                code: None,
                message: body,
            },
        })
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, HttpFailure> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| HttpFailure::Decode(e.to_string()))
    }

    /// Public GET, retrying transient network failures.
    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, HttpFailure> {
        (|| async { self.get_once(path, query).await })
            .retry(
                ConstantBuilder::default()
                    .with_delay(RETRY_DELAY)
                    .with_max_times(RETRY_TIMES),
            )
            .when(HttpFailure::is_transient)
            .notify(|err, delay| {
                warn!(path = %path, error = ?err, delay_ms = delay.as_millis() as u64, "Retrying Binance request");
            })
            .await
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, HttpFailure> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(HttpFailure::MissingCredentials)?;

        let mut query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        query.push(format!("recvWindow={}", RECV_WINDOW_MS));
        query.push(format!("timestamp={}", Utc::now().timestamp_millis()));
        let query = query.join("&");
        let signature = sign(&credentials.secret_key, &query);

        let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);
        let response = self
            .http
            .request(method, &url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| HttpFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl MarketDataProvider for BinanceClient {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        let query = [("symbol", exchange_symbol(symbol))];
        let ticker: Ticker24hr = self.get_public(ENDPOINT_TICKER, &query).await?;

        let invalid = MarketDataError::InvalidResponse;
        Ok(MarketSnapshot {
            timestamp: millis_to_datetime(ticker.close_time).map_err(invalid)?,
            symbol: symbol.to_string(),
            price: parse_decimal("lastPrice", &ticker.last_price).map_err(invalid)?,
            bid: parse_decimal("bidPrice", &ticker.bid_price).map_err(invalid)?,
            ask: parse_decimal("askPrice", &ticker.ask_price).map_err(invalid)?,
            volume: parse_decimal("quoteVolume", &ticker.quote_volume).map_err(invalid)?,
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let query = [
            ("symbol", exchange_symbol(symbol)),
            ("interval", timeframe.to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<Vec<Value>> = self.get_public(ENDPOINT_KLINES, &query).await?;
        debug!(symbol = %symbol, timeframe = %timeframe, rows = rows.len(), "Fetched klines");

        rows.iter()
            .map(|row| parse_kline(row).map_err(MarketDataError::InvalidResponse))
            .collect()
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        price: Option<f64>,
    ) -> Result<OrderRef, ExchangeError> {
        let mut params = vec![
            ("symbol", exchange_symbol(symbol)),
            ("side", side.as_str().to_uppercase()),
        ];
        match price {
            None => params.push(("type", "MARKET".to_string())),
            Some(limit) => {
                params.push(("type", "LIMIT".to_string()));
                params.push(("timeInForce", "GTC".to_string()));
                params.push(("price", limit.to_string()));
            }
        }
        params.push(("quantity", amount.to_string()));

        let response: OrderResponse =
            match self.send_signed(Method::POST, ENDPOINT_ORDER, &params).await {
                Ok(response) => response,
                Err(failure) => {
                    let err = ExchangeError::from(failure);
                    if matches!(
                        err,
                        ExchangeError::InsufficientBalance(_) | ExchangeError::Rejected { .. }
                    ) {
                        self.ledger.record_rejection(symbol, side, amount, price).await;
                    }
                    return Err(err);
                }
            };

        let order = OrderRef {
            id: response.order_id.to_string(),
            symbol: symbol.to_string(),
            side,
            amount,
            price: response.average_price().or(price),
            status: response.status.clone(),
            timestamp: millis_to_datetime(response.transact_time).unwrap_or_else(|_| Utc::now()),
        };
        self.ledger.record_fill(&order).await;

        info!(
            order_id = %order.id,
            symbol = %response.symbol,
            side = %side,
            amount = amount,
            status = %order.status,
            "Binance order accepted"
        );
        Ok(order)
    }

    async fn get_position(&self, symbol: &str) -> Result<Position, ExchangeError> {
        let (base, quote) = split_symbol(symbol).ok_or_else(|| ExchangeError::Rejected {
            code: None,
            message: format!("unsupported symbol {}", symbol),
        })?;
        let account: AccountResponse = self
            .send_signed(Method::GET, ENDPOINT_ACCOUNT, &[])
            .await?;

        let balance_of = |asset: &str| -> Result<Balance, ExchangeError> {
            match account.balances.iter().find(|b| b.asset.eq_ignore_ascii_case(asset)) {
                Some(b) => Ok(Balance::new(
                    parse_decimal("free", &b.free).map_err(ExchangeError::InvalidResponse)?,
                    parse_decimal("locked", &b.locked).map_err(ExchangeError::InvalidResponse)?,
                )),
                None => Ok(Balance::default()),
            }
        };

        Ok(Position {
            base: balance_of(base)?,
            quote: balance_of(quote)?,
        })
    }

    async fn get_trade_stats(&self) -> Result<TradeStats, ExchangeError> {
        Ok(self.ledger.stats().await)
    }
}
