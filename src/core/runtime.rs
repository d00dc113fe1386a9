//! Wires configuration into collaborators, the scheduler and the status server.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::{ExecutionMode, TradingConfig};
use crate::core::coordinator::{CoordinatorSettings, ExecutionCoordinator};
use crate::core::error::RuntimeError;
use crate::core::http::{start_server, AppState, HealthStatus};
use crate::core::scheduler::{CycleScheduler, LatestReport};
use crate::metrics::Metrics;
use crate::services::binance::{BinanceClient, Credentials};
use crate::services::exchange::ExchangeClient;
use crate::services::llm::{build_advisor, LlmAdvisor};
use crate::services::market_data::MarketDataProvider;
use crate::services::paper::PaperExchange;
use crate::strategies::parser::KeywordStrategyParser;
use crate::strategies::prompt::PromptBuilder;

pub struct TradingRuntime {
    config: TradingConfig,
    scheduler: CycleScheduler,
    state: AppState,
    server: RwLock<Option<JoinHandle<()>>>,
}

impl TradingRuntime {
    /// Builds Binance market data, the exchange for the configured mode and
    /// the advisor from the provider table.
    pub fn from_config(config: TradingConfig) -> Result<Self, RuntimeError> {
        let exchange_settings = &config.exchange;
        let credentials = match (&exchange_settings.api_key, &exchange_settings.secret_key) {
            (Some(api_key), Some(secret_key)) if exchange_settings.mode != ExecutionMode::Paper => {
                Some(Credentials {
                    api_key: api_key.clone(),
                    secret_key: secret_key.clone(),
                })
            }
            _ => None,
        };

        let binance = Arc::new(BinanceClient::new(
            exchange_settings.base_url(),
            credentials,
            config.call_timeout,
        )?);
        let market: Arc<dyn MarketDataProvider> = binance.clone();
        let exchange: Arc<dyn ExchangeClient> = match exchange_settings.mode {
            ExecutionMode::Paper => Arc::new(PaperExchange::new(
                market.clone(),
                &config.symbol,
                exchange_settings.paper_base_balance,
                exchange_settings.paper_quote_balance,
            )),
            ExecutionMode::Testnet | ExecutionMode::Live => binance,
        };
        let advisor: Arc<dyn LlmAdvisor> = Arc::new(build_advisor(&config.llm, config.call_timeout)?);

        info!(
            symbol = %config.symbol,
            mode = ?exchange_settings.mode,
            provider = %config.llm.provider,
            interval_secs = config.interval.as_secs(),
            "Trading runtime configured"
        );

        Self::with_collaborators(config, market, exchange, advisor)
    }

    pub fn with_collaborators(
        config: TradingConfig,
        market: Arc<dyn MarketDataProvider>,
        exchange: Arc<dyn ExchangeClient>,
        advisor: Arc<dyn LlmAdvisor>,
    ) -> Result<Self, RuntimeError> {
        let metrics = Arc::new(Metrics::new()?);
        let parser = Arc::new(KeywordStrategyParser::new(config.bounds, config.base_asset()));

        let coordinator = Arc::new(ExecutionCoordinator::new(
            market,
            exchange.clone(),
            advisor,
            parser,
            PromptBuilder::new(config.bounds),
            metrics.clone(),
            CoordinatorSettings {
                symbol: config.symbol.clone(),
                timeframe: config.timeframe.clone(),
                ohlcv_limit: config.ohlcv_limit,
                call_timeout: config.call_timeout,
            },
        ));

        let latest: LatestReport = Arc::new(RwLock::new(None));
        let scheduler = CycleScheduler::new(coordinator, config.interval, latest.clone(), metrics.clone());

        let state = AppState {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics,
            start_time: Arc::new(Instant::now()),
            latest,
            exchange,
            symbol: Arc::from(config.symbol.as_str()),
        };

        Ok(Self {
            config,
            scheduler,
            state,
            server: RwLock::new(None),
        })
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub async fn start(&self) {
        self.scheduler.start().await;

        if self.config.status_port == 0 {
            return;
        }
        let state = self.state.clone();
        let port = self.config.status_port;
        let handle = tokio::spawn(async move {
            if let Err(e) = start_server(state, port).await {
                error!(error = %e, port = port, "Status server stopped");
            }
        });
        *self.server.write().await = Some(handle);
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await;
        if let Some(handle) = self.server.write().await.take() {
            handle.abort();
        }
        self.state.health.write().await.status = "stopped".to_string();
        info!("Trading runtime stopped");
    }
}
