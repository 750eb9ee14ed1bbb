use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::JinaRerankConfig;
use crate::error::ProviderError;
use crate::providers::{read_json, require_api_key};
use crate::traits::RerankProvider;
use crate::types::{RerankItem, RerankRequest, RerankResponse};

#[derive(Clone)]
pub struct JinaRerankProvider {
    config: JinaRerankConfig,
    client: Client,
}

impl JinaRerankProvider {
    pub fn new(config: JinaRerankConfig) -> Result<Self, ProviderError> {
        require_api_key(&config.api_key)?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl RerankProvider for JinaRerankProvider {
    fn name(&self) -> &'static str {
        "jina"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn rerank(&self, request: RerankRequest) -> Result<RerankResponse, ProviderError> {
        debug!(
            provider = self.name(),
            model = %self.config.model,
            documents = request.documents.len(),
            "sending rerank request"
        );
        let payload = serde_json::json!({
            "model": self.config.model,
            "query": request.query,
            "documents": request.documents,
            "top_n": request.top_n,
        });

        let res = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;
        let parsed: JinaRerankResponse = read_json(res).await?;

        let items = parsed
            .results
            .into_iter()
            .map(|it| RerankItem {
                index: it.index,
                score: it.relevance_score,
            })
            .collect();

        Ok(RerankResponse {
            provider: self.name().to_string(),
            model: self.config.model.clone(),
            items,
        })
    }
}

#[derive(Debug, Deserialize)]
struct JinaRerankResponse {
    results: Vec<JinaRerankItem>,
}

#[derive(Debug, Deserialize)]
struct JinaRerankItem {
    index: usize,
    relevance_score: f64,
}
