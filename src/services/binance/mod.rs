//! Binance spot REST adapter.

pub mod client;
pub mod messages;

pub use client::{exchange_symbol, BinanceClient, Credentials, LIVE_BASE_URL, TESTNET_BASE_URL};
