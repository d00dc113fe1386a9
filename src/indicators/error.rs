use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient history: need at least {required} candles, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },
    #[error("{indicator} produced a non-finite value")]
    NonFinite { indicator: &'static str },
}
