//! LLM advisor capability and the provider adapter table.

pub mod client;
pub mod error;
pub mod types;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

pub use client::OpenAiCompatibleClient;
pub use error::LlmError;

use crate::config::LlmSettings;

#[async_trait]
pub trait LlmAdvisor: Send + Sync {
    /// One round-trip; returns the advisor's free text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Groq,
}

/// Static per-provider wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderProfile {
    pub name: &'static str,
    pub base_url: &'static str,
    pub default_model: &'static str,
    pub api_key_env: &'static str,
}

const OPENAI: ProviderProfile = ProviderProfile {
    name: "openai",
    base_url: "https://api.openai.com/v1",
    default_model: "gpt-4o-mini",
    api_key_env: "OPENAI_API_KEY",
};

const GROQ: ProviderProfile = ProviderProfile {
    name: "groq",
    base_url: "https://api.groq.com/openai/v1",
    default_model: "llama-3.1-8b-instant",
    api_key_env: "GROQ_API_KEY",
};

impl LlmProvider {
    pub fn profile(self) -> &'static ProviderProfile {
        match self {
            LlmProvider::OpenAi => &OPENAI,
            LlmProvider::Groq => &GROQ,
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "groq" => Ok(LlmProvider::Groq),
            other => Err(format!("unknown llm provider: {}", other)),
        }
    }
}

pub fn build_advisor(
    settings: &LlmSettings,
    timeout: Duration,
) -> Result<OpenAiCompatibleClient, LlmError> {
    let profile = settings.provider.profile();
    OpenAiCompatibleClient::new(
        profile.name,
        settings.base_url.as_deref().unwrap_or(profile.base_url),
        settings.api_key.clone(),
        settings.model.as_deref().unwrap_or(profile.default_model),
        settings.temperature,
        settings.max_tokens,
        timeout,
    )
}
