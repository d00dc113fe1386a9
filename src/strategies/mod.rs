//! Advisor-facing strategy pieces: prompt construction and reply parsing.

pub mod parser;
pub mod prompt;

pub use parser::{AmountBounds, KeywordStrategyParser, StrategyParser};
pub use prompt::PromptBuilder;
