pub mod aisearch;
pub mod cohere;
pub mod dashscope;
pub mod jina;

pub use aisearch::AiSearchRerankProvider;
pub use cohere::CohereRerankProvider;
pub use dashscope::DashScopeRerankProvider;
pub use jina::JinaRerankProvider;

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

fn require_api_key(api_key: &str) -> Result<(), ProviderError> {
    if api_key.trim().is_empty() {
        return Err(ProviderError::Config("api key is empty".to_string()));
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, ProviderError> {
    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}
