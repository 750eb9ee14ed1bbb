use std::time::Duration;

use serde::Deserialize;

use crate::error::RerankError;

pub const DASHSCOPE_API_KEY_ENV: &str = "DASHSCOPE_API_KEY";
pub const AISEARCH_API_KEY_ENV: &str = "AISEARCH_API_KEY";
pub const AISEARCH_ENDPOINT_ENV: &str = "AISEARCH_ENDPOINT";
pub const JINA_API_KEY_ENV: &str = "JINAAI_API_KEY";
pub const COHERE_API_KEY_ENV: &str = "COHERE_API_KEY";
pub const COHERE_API_KEY_FALLBACK_ENV: &str = "CO_API_KEY";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DASHSCOPE_RERANK_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/rerank/text-rerank/text-rerank";

/// Reads a variable from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Picks the explicit value when given, otherwise the first of `vars` that
/// `lookup` resolves. Blank values count as absent.
pub fn resolve_credential<L>(
    explicit: Option<String>,
    what: &str,
    vars: &[&str],
    lookup: L,
) -> Result<String, RerankError>
where
    L: Fn(&str) -> Option<String>,
{
    let non_blank = |v: String| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    if let Some(value) = explicit.and_then(non_blank) {
        return Ok(value);
    }
    for var in vars {
        if let Some(value) = lookup(var).and_then(non_blank) {
            return Ok(value);
        }
    }
    Err(RerankError::Configuration(format!(
        "{what} is not provided; pass it as an argument or set the environment variable {}",
        vars.join(" or ")
    )))
}

#[derive(Debug, Clone)]
pub struct DashScopeRerankConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl DashScopeRerankConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gte-rerank".to_string(),
            endpoint: DASHSCOPE_RERANK_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env(api_key: Option<String>) -> Result<Self, RerankError> {
        Self::from_lookup(api_key, process_env)
    }

    pub fn from_lookup<L>(api_key: Option<String>, lookup: L) -> Result<Self, RerankError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let key = resolve_credential(
            api_key,
            "DashScope API key",
            &[DASHSCOPE_API_KEY_ENV],
            lookup,
        )?;
        Ok(Self::new(key))
    }
}

/// Alibaba Cloud AI Search (OpenSearch platform) ranking service.
#[derive(Debug, Clone)]
pub struct AiSearchRerankConfig {
    pub api_key: String,
    /// Host of the workspace, e.g. `xxx.platform-cn-shanghai.opensearch.aliyuncs.com`.
    /// A full `http(s)://` URL is used as given.
    pub endpoint: String,
    pub workspace: String,
    pub service_id: String,
    pub protocol: String,
    pub timeout: Duration,
}

impl AiSearchRerankConfig {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            workspace: "default".to_string(),
            service_id: "ops-bge-reranker-larger".to_string(),
            protocol: "http".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env(
        api_key: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self, RerankError> {
        Self::from_lookup(api_key, endpoint, process_env)
    }

    pub fn from_lookup<L>(
        api_key: Option<String>,
        endpoint: Option<String>,
        lookup: L,
    ) -> Result<Self, RerankError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let key = resolve_credential(
            api_key,
            "AI Search API key",
            &[AISEARCH_API_KEY_ENV],
            &lookup,
        )?;
        let endpoint = resolve_credential(
            endpoint,
            "AI Search endpoint",
            &[AISEARCH_ENDPOINT_ENV],
            &lookup,
        )?;
        Ok(Self::new(key, endpoint))
    }

    pub fn ranker_url(&self) -> String {
        let base = if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")
        {
            self.endpoint.trim_end_matches('/').to_string()
        } else {
            format!("{}://{}", self.protocol, self.endpoint.trim_end_matches('/'))
        };
        format!(
            "{base}/v3/openapi/workspaces/{}/ranker/{}",
            self.workspace, self.service_id
        )
    }
}

#[derive(Debug, Clone)]
pub struct JinaRerankConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl JinaRerankConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "jina-reranker-v1-turbo-en".to_string(),
            endpoint: "https://api.jina.ai/v1/rerank".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env(api_key: Option<String>) -> Result<Self, RerankError> {
        Self::from_lookup(api_key, process_env)
    }

    pub fn from_lookup<L>(api_key: Option<String>, lookup: L) -> Result<Self, RerankError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let key = resolve_credential(api_key, "Jina API key", &[JINA_API_KEY_ENV], lookup)?;
        Ok(Self::new(key))
    }
}

#[derive(Debug, Clone)]
pub struct CohereRerankConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl CohereRerankConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "rerank-v3.5".to_string(),
            endpoint: "https://api.cohere.com/v2/rerank".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env(api_key: Option<String>) -> Result<Self, RerankError> {
        Self::from_lookup(api_key, process_env)
    }

    pub fn from_lookup<L>(api_key: Option<String>, lookup: L) -> Result<Self, RerankError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let key = resolve_credential(
            api_key,
            "Cohere API key",
            &[COHERE_API_KEY_ENV, COHERE_API_KEY_FALLBACK_ENV],
            lookup,
        )?;
        Ok(Self::new(key))
    }
}

#[derive(Debug, Clone)]
pub enum RerankProviderConfig {
    DashScope(DashScopeRerankConfig),
    AiSearch(AiSearchRerankConfig),
    Jina(JinaRerankConfig),
    Cohere(CohereRerankConfig),
}

/// Execution options of a reranking node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerankOptions {
    /// Maximum number of backend calls in flight.
    pub batch: usize,
    /// Reject `top_k` larger than a query's candidate count instead of clamping.
    pub strict_top_k: bool,
    /// Upper bound on a whole rerank call.
    pub timeout: Option<Duration>,
}

impl Default for RerankOptions {
    fn default() -> Self {
        Self {
            batch: 8,
            strict_top_k: false,
            timeout: None,
        }
    }
}

impl RerankOptions {
    pub fn with_batch(mut self, batch: usize) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_strict_top_k(mut self, strict: bool) -> Self {
        self.strict_top_k = strict;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), RerankError> {
        if self.batch == 0 {
            return Err(RerankError::InvalidInput(
                "batch must be greater than zero".to_string(),
            ));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(RerankError::InvalidInput(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for building a reranker by name, as they appear in a pipeline
/// configuration. Unset fields fall back to the environment or the backend's
/// defaults.
///
/// `workspace` and `service_id` address an AI Search ranker; the other HTTP
/// backends refuse them. `pass` reads `strict_top_k` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RerankerParams {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub workspace: Option<String>,
    pub service_id: Option<String>,
    pub batch: Option<usize>,
    pub strict_top_k: bool,
    pub timeout_ms: Option<u64>,
}

impl RerankerParams {
    pub fn options(&self, default_batch: usize) -> RerankOptions {
        RerankOptions {
            batch: self.batch.unwrap_or(default_batch),
            strict_top_k: self.strict_top_k,
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }

    /// Fails when AI Search settings are handed to another backend.
    pub fn reject_aisearch_fields(&self, reranker: &str) -> Result<(), RerankError> {
        let stray: Vec<&str> = [
            ("workspace", self.workspace.is_some()),
            ("service_id", self.service_id.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, set)| set.then_some(field))
        .collect();
        if stray.is_empty() {
            return Ok(());
        }
        Err(RerankError::Configuration(format!(
            "{} only apply to alibabacloud_aisearch, not {reranker}",
            stray.join(" and ")
        )))
    }
}
