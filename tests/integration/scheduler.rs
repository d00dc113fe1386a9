//! Loop timing: normal interval after a cycle, fixed backoff after a failure

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tradefuse::core::scheduler::{CycleScheduler, LatestReport, ERROR_BACKOFF};
use tradefuse::models::report::CycleOutcome;
use tradefuse::services::exchange::ExchangeError;
use tradefuse::services::market_data::MarketDataError;

use super::test_utils::*;

const INTERVAL: Duration = Duration::from_secs(30);

fn scheduler(h: &Harness) -> CycleScheduler {
    let latest: LatestReport = Arc::new(RwLock::new(None));
    CycleScheduler::new(h.coordinator.clone(), INTERVAL, latest, h.metrics.clone())
}

fn gaps(calls: &[tokio::time::Instant]) -> Vec<Duration> {
    calls.windows(2).map(|w| w[1] - w[0]).collect()
}

#[tokio::test(start_paused = true)]
async fn test_waits_interval_between_cycles() {
    let h = harness(
        ScriptedMarket::new(flat_candles(60)),
        RecordingExchange::new(),
        ScriptedAdvisor::replying("hold"),
    );
    let scheduler = scheduler(&h);

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(75)).await;
    scheduler.stop().await;

    let calls = h.market.calls();
    assert_eq!(calls.len(), 3);
    for gap in gaps(&calls) {
        assert_eq!(gap, INTERVAL);
    }
    assert_eq!(
        h.metrics
            .trading_cycles_total
            .with_label_values(&["observed"])
            .get(),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn test_backs_off_after_failure_then_recovers() {
    let h = harness(
        ScriptedMarket::failing(
            flat_candles(60),
            2,
            MarketDataError::Network("connection refused".to_string()),
        ),
        RecordingExchange::new(),
        ScriptedAdvisor::replying("hold"),
    );
    let scheduler = scheduler(&h);

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(45)).await;
    scheduler.stop().await;

    let calls = h.market.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(
        gaps(&calls),
        vec![ERROR_BACKOFF, ERROR_BACKOFF, INTERVAL]
    );
    assert_eq!(
        h.metrics
            .trading_cycles_total
            .with_label_values(&["failed"])
            .get(),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_published_as_latest_report() {
    let h = harness(
        ScriptedMarket::failing(
            flat_candles(60),
            usize::MAX,
            MarketDataError::Network("connection refused".to_string()),
        ),
        RecordingExchange::new(),
        ScriptedAdvisor::replying("hold"),
    );
    let scheduler = scheduler(&h);

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let latest = scheduler.latest().read().await.clone().unwrap();
    assert_eq!(latest.symbol, SYMBOL);
    match latest.outcome {
        CycleOutcome::Failed { error } => assert!(error.contains("connection refused")),
        other => panic!("expected failed, got {:?}", other),
    }
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_ends_the_loop() {
    let h = harness(
        ScriptedMarket::new(flat_candles(60)),
        RecordingExchange::new(),
        ScriptedAdvisor::replying("hold"),
    );
    let scheduler = scheduler(&h);

    assert!(!scheduler.is_running().await);
    scheduler.start().await;
    assert!(scheduler.is_running().await);

    tokio::time::sleep(Duration::from_secs(1)).await;
    scheduler.stop().await;
    assert!(!scheduler.is_running().await);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(h.market.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_runs_one_loop() {
    let h = harness(
        ScriptedMarket::new(flat_candles(60)),
        RecordingExchange::new(),
        ScriptedAdvisor::replying("hold"),
    );
    let scheduler = scheduler(&h);

    scheduler.start().await;
    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    scheduler.stop().await;

    assert_eq!(h.market.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop() {
    let h = harness(
        ScriptedMarket::new(flat_candles(60)),
        RecordingExchange::new(),
        ScriptedAdvisor::replying("hold"),
    );
    let scheduler = scheduler(&h);

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    scheduler.stop().await;

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    scheduler.stop().await;

    assert_eq!(h.market.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_order_backs_off() {
    let h = harness(
        ScriptedMarket::new(flat_candles(60)),
        RecordingExchange::rejecting(ExchangeError::Rejected {
            code: Some(-1013),
            message: "Filter failure: LOT_SIZE".to_string(),
        }),
        ScriptedAdvisor::replying("I recommend buying 0.01 BTC now"),
    );
    let scheduler = scheduler(&h);

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(12)).await;
    scheduler.stop().await;

    let calls = h.market.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(gaps(&calls), vec![ERROR_BACKOFF, ERROR_BACKOFF]);
    // one attempt per cycle, never retried within a cycle
    assert_eq!(h.exchange.orders().len(), 3);
}
