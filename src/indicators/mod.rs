pub mod error;

pub mod momentum;
pub mod trend;

pub use error::IndicatorError;
