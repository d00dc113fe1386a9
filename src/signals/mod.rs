//! Signal evaluation interfaces.

pub mod engine;
pub mod technical;
pub mod validator;

pub use engine::{IndicatorAnalysis, IndicatorEngine, MIN_CANDLES};
pub use technical::derive_signals;
pub use validator::validate;
