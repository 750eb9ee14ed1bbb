use std::time::Duration;

use autorag_core::ShapeMismatchError;
use thiserror::Error;

/// Failure inside a single backend adapter call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("provider returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("provider API error: status={status}, body={body}")]
    Api { status: u16, body: String },
}

/// Error surfaced to callers of a reranking module.
#[derive(Debug, Error)]
pub enum RerankError {
    /// Credentials or endpoints are missing or unusable. Raised while
    /// constructing a reranker, never from a rerank call.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("backend error ({provider}): {source}")]
    Backend {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(#[from] ShapeMismatchError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("rerank timed out after {0:?}")]
    Timeout(Duration),

    #[error("unknown reranker `{0}`")]
    UnknownReranker(String),
}

impl RerankError {
    pub fn backend(provider: impl Into<String>, source: ProviderError) -> Self {
        Self::Backend {
            provider: provider.into(),
            source,
        }
    }

    /// Maps an adapter construction failure onto [`RerankError::Configuration`].
    pub fn from_construction(provider: &str, err: ProviderError) -> Self {
        match err {
            ProviderError::Config(msg) => Self::Configuration(format!("{provider}: {msg}")),
            other => Self::Configuration(format!("{provider}: {other}")),
        }
    }
}
