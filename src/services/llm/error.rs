use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LlmError {
    #[error("[{provider}] auth error: {message}")]
    Auth { provider: String, message: String },

    #[error("[{provider}] rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited {
        provider: String,
        retry_after_ms: Option<u64>,
    },

    #[error("[{provider}] network error: {message}")]
    Network { provider: String, message: String },

    #[error("[{provider}] request timeout ({timeout_ms}ms)")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("[{provider}] api error {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("[{provider}] invalid response: {message}")]
    InvalidResponse { provider: String, message: String },
}
