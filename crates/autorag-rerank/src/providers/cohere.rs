use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::CohereRerankConfig;
use crate::error::ProviderError;
use crate::providers::{read_json, require_api_key};
use crate::traits::RerankProvider;
use crate::types::{RerankItem, RerankRequest, RerankResponse};

#[derive(Clone)]
pub struct CohereRerankProvider {
    config: CohereRerankConfig,
    client: Client,
}

impl CohereRerankProvider {
    pub fn new(config: CohereRerankConfig) -> Result<Self, ProviderError> {
        require_api_key(&config.api_key)?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl RerankProvider for CohereRerankProvider {
    fn name(&self) -> &'static str {
        "cohere"
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
        // v2 takes plain strings; v1 endpoints still expect {"text": ...} objects.
        let documents = if self.config.endpoint.contains("/v1/") {
            request
                .documents
                .into_iter()
                .map(|text| serde_json::json!({"text": text}))
                .collect::<Vec<_>>()
        } else {
            request
                .documents
                .into_iter()
                .map(serde_json::Value::String)
                .collect::<Vec<_>>()
        };
        let payload = serde_json::json!({
            "model": self.config.model,
            "query": request.query,
            "documents": documents,
            "top_n": request.top_n,
        });

        let res = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;
        let parsed: CohereRerankResponse = read_json(res).await?;

        let items = parsed
            .results
            .into_iter()
            .map(|it| RerankItem {
                index: it.index,
                score: it.score,
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
struct CohereRerankResponse {
    results: Vec<CohereRerankItem>,
}

#[derive(Debug, Deserialize)]
struct CohereRerankItem {
    index: usize,
    #[serde(alias = "relevance_score")]
    score: f64,
}
