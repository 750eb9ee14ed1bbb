use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DashScopeRerankConfig;
use crate::error::ProviderError;
use crate::providers::{read_json, require_api_key};
use crate::traits::RerankProvider;
use crate::types::{RerankItem, RerankRequest, RerankResponse};

/// Alibaba Cloud Model Studio (DashScope) text rerank service.
#[derive(Clone)]
pub struct DashScopeRerankProvider {
    config: DashScopeRerankConfig,
    client: Client,
}

impl DashScopeRerankProvider {
    pub fn new(config: DashScopeRerankConfig) -> Result<Self, ProviderError> {
        require_api_key(&config.api_key)?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl RerankProvider for DashScopeRerankProvider {
    fn name(&self) -> &'static str {
        "dashscope"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn rerank(&self, request: RerankRequest) -> Result<RerankResponse, ProviderError> {
        let payload = DashScopeRequest {
            model: &self.config.model,
            input: DashScopeInput {
                query: &request.query,
                documents: &request.documents,
            },
            parameters: DashScopeParameters {
                top_n: request.top_n,
                return_documents: false,
            },
        };
        debug!(
            provider = self.name(),
            model = %self.config.model,
            documents = request.documents.len(),
            top_n = request.top_n,
            "sending rerank request"
        );

        let res = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;
        let parsed: DashScopeResponse = read_json(res).await?;

        let items = parsed
            .output
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

#[derive(Debug, Serialize)]
struct DashScopeRequest<'a> {
    model: &'a str,
    input: DashScopeInput<'a>,
    parameters: DashScopeParameters,
}

#[derive(Debug, Serialize)]
struct DashScopeInput<'a> {
    query: &'a str,
    documents: &'a [String],
}

#[derive(Debug, Serialize)]
struct DashScopeParameters {
    top_n: usize,
    return_documents: bool,
}

#[derive(Debug, Deserialize)]
struct DashScopeResponse {
    output: DashScopeOutput,
}

#[derive(Debug, Deserialize)]
struct DashScopeOutput {
    results: Vec<DashScopeItem>,
}

#[derive(Debug, Deserialize)]
struct DashScopeItem {
    index: usize,
    relevance_score: f64,
}
