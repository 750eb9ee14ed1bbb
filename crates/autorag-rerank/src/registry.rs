use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::{
    AiSearchRerankConfig, CohereRerankConfig, DashScopeRerankConfig, JinaRerankConfig,
    RerankProviderConfig, RerankerParams, process_env,
};
use crate::error::RerankError;
use crate::factory::build_rerank_provider;
use crate::reranker::{PassReranker, ProviderReranker};
use crate::traits::PassageReranker;

/// Source of environment variables consulted when params omit a credential.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub type RerankerConstructor = Arc<
    dyn Fn(&RerankerParams, &EnvLookup) -> Result<Arc<dyn PassageReranker>, RerankError>
        + Send
        + Sync,
>;

/// Maps reranker names, as written in pipeline configs, to constructors.
pub struct RerankerRegistry {
    constructors: BTreeMap<String, RerankerConstructor>,
    env: EnvLookup,
}

impl RerankerRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
            env: Arc::new(process_env),
        }
    }

    /// A registry holding every reranker this crate ships.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("pass", |params, _| {
            Ok(Arc::new(PassReranker::new(params.strict_top_k)) as Arc<dyn PassageReranker>)
        });
        registry.register("dashscope", |params, env| {
            params.reject_aisearch_fields("dashscope")?;
            let mut cfg =
                DashScopeRerankConfig::from_lookup(params.api_key.clone(), |k| env(k))?;
            if let Some(model) = &params.model {
                cfg.model.clone_from(model);
            }
            if let Some(endpoint) = &params.endpoint {
                cfg.endpoint.clone_from(endpoint);
            }
            provider_reranker(RerankProviderConfig::DashScope(cfg), params, 8)
        });
        registry.register("alibabacloud_aisearch", |params, env| {
            let mut cfg = AiSearchRerankConfig::from_lookup(
                params.api_key.clone(),
                params.endpoint.clone(),
                |k| env(k),
            )?;
            if let Some(workspace) = &params.workspace {
                cfg.workspace.clone_from(workspace);
            }
            if let Some(service_id) = params.service_id.as_ref().or(params.model.as_ref()) {
                cfg.service_id.clone_from(service_id);
            }
            provider_reranker(RerankProviderConfig::AiSearch(cfg), params, 64)
        });
        registry.register("jina", |params, env| {
            params.reject_aisearch_fields("jina")?;
            let mut cfg = JinaRerankConfig::from_lookup(params.api_key.clone(), |k| env(k))?;
            if let Some(model) = &params.model {
                cfg.model.clone_from(model);
            }
            if let Some(endpoint) = &params.endpoint {
                cfg.endpoint.clone_from(endpoint);
            }
            provider_reranker(RerankProviderConfig::Jina(cfg), params, 8)
        });
        registry.register("cohere", |params, env| {
            params.reject_aisearch_fields("cohere")?;
            let mut cfg = CohereRerankConfig::from_lookup(params.api_key.clone(), |k| env(k))?;
            if let Some(model) = &params.model {
                cfg.model.clone_from(model);
            }
            if let Some(endpoint) = &params.endpoint {
                cfg.endpoint.clone_from(endpoint);
            }
            provider_reranker(RerankProviderConfig::Cohere(cfg), params, 64)
        });
        registry
    }

    /// Replaces the environment source, mostly for tests.
    pub fn with_env_lookup<L>(mut self, lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Adds or replaces a constructor. Names are matched case-insensitively.
    pub fn register<C>(&mut self, name: &str, constructor: C)
    where
        C: Fn(&RerankerParams, &EnvLookup) -> Result<Arc<dyn PassageReranker>, RerankError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(name.to_lowercase(), Arc::new(constructor));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn build(
        &self,
        name: &str,
        params: &RerankerParams,
    ) -> Result<Arc<dyn PassageReranker>, RerankError> {
        let key = name.to_lowercase();
        let constructor = self
            .constructors
            .get(&key)
            .ok_or_else(|| RerankError::UnknownReranker(name.to_string()))?;
        debug!(reranker = %key, "building reranker");
        constructor(params, &self.env)
    }
}

impl Default for RerankerRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl fmt::Debug for RerankerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RerankerRegistry")
            .field("names", &self.constructors.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn provider_reranker(
    cfg: RerankProviderConfig,
    params: &RerankerParams,
    default_batch: usize,
) -> Result<Arc<dyn PassageReranker>, RerankError> {
    let provider = build_rerank_provider(cfg)?;
    let reranker = ProviderReranker::new(provider, params.options(default_batch))?;
    Ok(Arc::new(reranker))
}
