//! One pass of the trading loop:
//! FETCH -> ANALYZE -> ADVISE -> PARSE -> VALIDATE -> EXECUTE.
//!
//! Data problems end the cycle with a `Skipped` report; transport and
//! exchange failures are returned as `CycleError` so the scheduler backs off.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::error::CycleError;
use crate::metrics::Metrics;
use crate::models::decision::FusedDecision;
use crate::models::market::{MarketSnapshot, OhlcvSeries};
use crate::models::report::{CycleOutcome, CycleReport};
use crate::services::exchange::ExchangeClient;
use crate::services::llm::LlmAdvisor;
use crate::services::market_data::{MarketDataError, MarketDataProvider};
use crate::signals::engine::IndicatorEngine;
use crate::strategies::parser::StrategyParser;
use crate::strategies::prompt::PromptBuilder;

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub symbol: String,
    pub timeframe: String,
    pub ohlcv_limit: usize,
    /// Upper bound on market-data and advisor calls.
    pub call_timeout: Duration,
}

/// FETCH result: usable market data, or a finished `Skipped` report when the
/// data was malformed.
enum Fetched {
    Data(MarketSnapshot, OhlcvSeries),
    Skipped(CycleReport),
}

pub struct ExecutionCoordinator {
    market: Arc<dyn MarketDataProvider>,
    exchange: Arc<dyn ExchangeClient>,
    advisor: Arc<dyn LlmAdvisor>,
    parser: Arc<dyn StrategyParser>,
    prompts: PromptBuilder,
    metrics: Arc<Metrics>,
    settings: CoordinatorSettings,
}

impl ExecutionCoordinator {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        exchange: Arc<dyn ExchangeClient>,
        advisor: Arc<dyn LlmAdvisor>,
        parser: Arc<dyn StrategyParser>,
        prompts: PromptBuilder,
        metrics: Arc<Metrics>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            market,
            exchange,
            advisor,
            parser,
            prompts,
            metrics,
            settings,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.settings.symbol
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, MarketDataError>
    where
        F: Future<Output = Result<T, MarketDataError>>,
    {
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout {
                timeout_ms: self.settings.call_timeout.as_millis() as u64,
            }),
        }
    }

    fn skipped(&self, snapshot: Option<&MarketSnapshot>, reason: String) -> CycleReport {
        warn!(symbol = %self.settings.symbol, reason = %reason, "Cycle skipped");
        let mut report = CycleReport::new(&self.settings.symbol, CycleOutcome::Skipped { reason });
        report.price = snapshot.map(|s| s.price);
        report
    }

    async fn fetch(&self) -> Result<Fetched, CycleError> {
        let symbol = &self.settings.symbol;

        let snapshot = match self.bounded(self.market.fetch_snapshot(symbol)).await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_data_error() => {
                return Ok(Fetched::Skipped(
                    self.skipped(None, format!("malformed snapshot: {}", e)),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        let candles = match self
            .bounded(self.market.fetch_ohlcv(symbol, &self.settings.timeframe, self.settings.ohlcv_limit))
            .await
        {
            Ok(candles) => candles,
            Err(e) if e.is_data_error() => {
                return Ok(Fetched::Skipped(
                    self.skipped(Some(&snapshot), format!("malformed ohlcv: {}", e)),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        match OhlcvSeries::new(candles) {
            Ok(series) => Ok(Fetched::Data(snapshot, series)),
            Err(e) => Ok(Fetched::Skipped(self.skipped(
                Some(&snapshot),
                format!("invalid ohlcv series: {}", e),
            ))),
        }
    }

    /// Any advisor failure reads as an empty reply, which parses to hold.
    async fn advise(&self, user_prompt: &str) -> String {
        let call = self.advisor.complete(self.prompts.system_prompt(), user_prompt);
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                self.metrics.llm_failures_total.inc();
                warn!(error = %e, "Advisor call failed, holding");
                String::new()
            }
            Err(_) => {
                self.metrics.llm_failures_total.inc();
                warn!(
                    timeout_ms = self.settings.call_timeout.as_millis() as u64,
                    "Advisor call timed out, holding"
                );
                String::new()
            }
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let symbol = &self.settings.symbol;

        // FETCH
        let (snapshot, series) = match self.fetch().await? {
            Fetched::Data(snapshot, series) => (snapshot, series),
            Fetched::Skipped(report) => return Ok(report),
        };

        // ANALYZE
        let analysis = match IndicatorEngine::compute(&series) {
            Ok(analysis) => analysis,
            Err(e) => return Ok(self.skipped(Some(&snapshot), e.to_string())),
        };
        debug!(
            symbol = %symbol,
            rsi = analysis.state.rsi,
            macd_hist = analysis.state.macd_hist,
            signals = analysis.signals.len(),
            trend = %analysis.state.trend.description,
            "Indicators computed"
        );

        // ADVISE
        let user_prompt = self.prompts.user_prompt(&snapshot, &analysis);
        let advice = self.advise(&user_prompt).await;

        // PARSE / VALIDATE
        let decision = self.parser.parse(&advice);
        let fused = FusedDecision::fuse(&decision, &analysis.signals);

        let mut report = CycleReport::new(symbol, CycleOutcome::Observed);
        report.price = Some(snapshot.price);
        report.indicators = Some(analysis.state);
        report.signals = analysis.signals;
        report.advice = Some(advice);
        report.decision = Some(decision);
        report.approved = fused.approved;

        // EXECUTE
        let side = match fused.action.side() {
            Some(side) if fused.approved && fused.amount > 0.0 => side,
            _ => return Ok(report),
        };

        let order = self
            .exchange
            .place_order(symbol, side, fused.amount, None)
            .await?;
        self.metrics
            .orders_placed_total
            .with_label_values(&[side.as_str()])
            .inc();
        info!(
            symbol = %symbol,
            order_id = %order.id,
            side = %side,
            amount = fused.amount,
            "Order placed"
        );

        report.outcome = CycleOutcome::Executed { order };
        Ok(report)
    }
}
