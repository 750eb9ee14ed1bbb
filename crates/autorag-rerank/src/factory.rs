use std::sync::Arc;

use crate::config::RerankProviderConfig;
use crate::error::RerankError;
use crate::providers::{
    AiSearchRerankProvider, CohereRerankProvider, DashScopeRerankProvider, JinaRerankProvider,
};
use crate::traits::RerankProvider;

pub fn build_rerank_provider(
    cfg: RerankProviderConfig,
) -> Result<Arc<dyn RerankProvider>, RerankError> {
    match cfg {
        RerankProviderConfig::DashScope(c) => DashScopeRerankProvider::new(c)
            .map(|p| Arc::new(p) as Arc<dyn RerankProvider>)
            .map_err(|e| RerankError::from_construction("dashscope", e)),
        RerankProviderConfig::AiSearch(c) => AiSearchRerankProvider::new(c)
            .map(|p| Arc::new(p) as Arc<dyn RerankProvider>)
            .map_err(|e| RerankError::from_construction("alibabacloud_aisearch", e)),
        RerankProviderConfig::Jina(c) => JinaRerankProvider::new(c)
            .map(|p| Arc::new(p) as Arc<dyn RerankProvider>)
            .map_err(|e| RerankError::from_construction("jina", e)),
        RerankProviderConfig::Cohere(c) => CohereRerankProvider::new(c)
            .map(|p| Arc::new(p) as Arc<dyn RerankProvider>)
            .map_err(|e| RerankError::from_construction("cohere", e)),
    }
}
