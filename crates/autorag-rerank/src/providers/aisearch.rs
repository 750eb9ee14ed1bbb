use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AiSearchRerankConfig;
use crate::error::ProviderError;
use crate::providers::{read_json, require_api_key};
use crate::traits::RerankProvider;
use crate::types::{RerankItem, RerankRequest, RerankResponse};

/// Ranking service of the Alibaba Cloud AI Search open platform.
///
/// The service scores every submitted document and has no `top_n` knob, so
/// truncation is left to the caller.
#[derive(Clone)]
pub struct AiSearchRerankProvider {
    config: AiSearchRerankConfig,
    url: String,
    client: Client,
}

impl AiSearchRerankProvider {
    pub fn new(config: AiSearchRerankConfig) -> Result<Self, ProviderError> {
        require_api_key(&config.api_key)?;
        if config.endpoint.trim().is_empty() {
            return Err(ProviderError::Config("endpoint is empty".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        let url = config.ranker_url();
        Ok(Self {
            config,
            url,
            client,
        })
    }
}

#[async_trait::async_trait]
impl RerankProvider for AiSearchRerankProvider {
    fn name(&self) -> &'static str {
        "alibabacloud_aisearch"
    }

    fn model(&self) -> &str {
        &self.config.service_id
    }

    async fn rerank(&self, request: RerankRequest) -> Result<RerankResponse, ProviderError> {
        let payload = AiSearchRequest {
            query: &request.query,
            docs: &request.documents,
        };
        debug!(
            provider = self.name(),
            service_id = %self.config.service_id,
            documents = request.documents.len(),
            "sending rerank request"
        );

        let res = self
            .client
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;
        let parsed: AiSearchResponse = read_json(res).await?;

        let items = parsed
            .result
            .scores
            .into_iter()
            .map(|it| RerankItem {
                index: it.index,
                score: it.score,
            })
            .collect();

        Ok(RerankResponse {
            provider: self.name().to_string(),
            model: self.config.service_id.clone(),
            items,
        })
    }
}

#[derive(Debug, Serialize)]
struct AiSearchRequest<'a> {
    query: &'a str,
    docs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AiSearchResponse {
    result: AiSearchResult,
}

#[derive(Debug, Deserialize)]
struct AiSearchResult {
    scores: Vec<AiSearchScore>,
}

#[derive(Debug, Deserialize)]
struct AiSearchScore {
    index: usize,
    score: f64,
}
