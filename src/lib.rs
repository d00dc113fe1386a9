//! tradefuse: a polling trading loop that fuses RSI/MACD technical signals
//! with an LLM advisor's free-text recommendation and only trades when both agree.

pub mod common;
pub mod config;
pub mod core;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
pub mod strategies;
