use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use autorag_core::{CandidateTable, QueryCandidates, QueryRanking, RerankResult, ShapeMismatchError};
use tracing::{info, warn};

use crate::batch::process_batch;
use crate::config::RerankOptions;
use crate::error::{ProviderError, RerankError};
use crate::traits::{PassageReranker, RerankProvider};
use crate::types::{RerankItem, RerankRequest};

/// Checks `top_k` against the table. With `strict` set, a query holding fewer
/// candidates than `top_k` is an error; otherwise `top_k` is clamped later.
pub fn validate_top_k(
    table: &CandidateTable,
    top_k: usize,
    strict: bool,
) -> Result<(), RerankError> {
    if top_k == 0 {
        return Err(RerankError::InvalidInput(
            "top_k must be greater than zero".to_string(),
        ));
    }
    if strict {
        if let Some(short) = table.iter().find(|c| c.len() < top_k) {
            return Err(RerankError::InvalidInput(format!(
                "top_k {top_k} exceeds the {} candidates of query {}",
                short.len(),
                short.index
            )));
        }
    }
    Ok(())
}

/// Turns backend scores into the query's top `top_k` passages.
///
/// Items are ordered by descending score (ties keep backend order) and every
/// index must address one of the query's candidates exactly once, so ids in
/// the output always come from the input.
pub fn rank_candidates(
    provider: &str,
    candidates: &QueryCandidates<'_>,
    mut items: Vec<RerankItem>,
    top_k: usize,
) -> Result<QueryRanking, RerankError> {
    let expected = top_k.min(candidates.len());

    let mut seen = vec![false; candidates.len()];
    for item in &items {
        match seen.get_mut(item.index) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(RerankError::backend(
                    provider,
                    ProviderError::InvalidResponse(format!(
                        "index {} returned twice for query {}",
                        item.index, candidates.index
                    )),
                ));
            }
            None => {
                return Err(RerankError::backend(
                    provider,
                    ProviderError::InvalidResponse(format!(
                        "index {} out of range for {} documents of query {}",
                        item.index,
                        candidates.len(),
                        candidates.index
                    )),
                ));
            }
        }
    }
    if items.len() < expected {
        return Err(ShapeMismatchError::Candidates {
            query: candidates.index,
            what: "reranked items",
            expected,
            found: items.len(),
        }
        .into());
    }

    items.sort_by(|a, b| b.score.total_cmp(&a.score));
    items.truncate(expected);

    let mut ranking = QueryRanking {
        contents: Vec::with_capacity(expected),
        ids: Vec::with_capacity(expected),
        scores: Vec::with_capacity(expected),
    };
    for item in items {
        if let (Some(content), Some(id)) = (
            candidates.contents.get(item.index),
            candidates.ids.get(item.index),
        ) {
            ranking.contents.push(content.clone());
            ranking.ids.push(id.clone());
            ranking.scores.push(item.score);
        }
    }
    Ok(ranking)
}

/// Reranks a whole table through a per-query [`RerankProvider`], fanning the
/// queries out with [`process_batch`].
#[derive(Clone)]
pub struct ProviderReranker {
    provider: Arc<dyn RerankProvider>,
    options: RerankOptions,
}

impl ProviderReranker {
    pub fn new(
        provider: Arc<dyn RerankProvider>,
        options: RerankOptions,
    ) -> Result<Self, RerankError> {
        options.validate()?;
        Ok(Self { provider, options })
    }

    pub fn provider(&self) -> &Arc<dyn RerankProvider> {
        &self.provider
    }

    pub fn options(&self) -> &RerankOptions {
        &self.options
    }

    async fn rerank_query(
        &self,
        candidates: QueryCandidates<'_>,
        top_k: usize,
    ) -> Result<QueryRanking, RerankError> {
        if candidates.is_empty() {
            return Ok(QueryRanking::default());
        }

        let request = RerankRequest {
            query: candidates.query.to_string(),
            documents: candidates.contents.to_vec(),
            top_n: top_k.min(candidates.len()),
        };
        let response = self.provider.rerank(request).await.map_err(|source| {
            warn!(
                provider = self.provider.name(),
                query = candidates.index,
                error = %source,
                "rerank backend call failed"
            );
            RerankError::backend(self.provider.name(), source)
        })?;

        rank_candidates(self.provider.name(), &candidates, response.items, top_k)
    }
}

#[async_trait]
impl PassageReranker for ProviderReranker {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn rerank(
        &self,
        table: &CandidateTable,
        top_k: usize,
    ) -> Result<RerankResult, RerankError> {
        validate_top_k(table, top_k, self.options.strict_top_k)?;
        if table.is_empty() {
            return Ok(RerankResult::default());
        }

        let started = Instant::now();
        let tasks = table.iter().map(|c| self.rerank_query(c, top_k));
        let batch = process_batch(tasks, self.options.batch);
        let rankings = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, batch)
                .await
                .map_err(|_| RerankError::Timeout(limit))??,
            None => batch.await?,
        };

        info!(
            reranker = self.provider.name(),
            model = self.provider.model(),
            queries = table.len(),
            top_k,
            batch = self.options.batch,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "rerank completed"
        );
        Ok(RerankResult::from_rankings(rankings))
    }
}

/// Keeps the retrieval order and scores, cutting each list to `top_k`.
/// Serves as the baseline when comparing rerankers.
#[derive(Debug, Clone, Default)]
pub struct PassReranker {
    strict_top_k: bool,
}

impl PassReranker {
    pub fn new(strict_top_k: bool) -> Self {
        Self { strict_top_k }
    }
}

#[async_trait]
impl PassageReranker for PassReranker {
    fn name(&self) -> &str {
        "pass"
    }

    async fn rerank(
        &self,
        table: &CandidateTable,
        top_k: usize,
    ) -> Result<RerankResult, RerankError> {
        validate_top_k(table, top_k, self.strict_top_k)?;
        let rankings = table
            .iter()
            .map(|c| QueryRanking {
                contents: c.contents.iter().take(top_k).cloned().collect(),
                ids: c.ids.iter().take(top_k).cloned().collect(),
                scores: c.scores.iter().take(top_k).copied().collect(),
            })
            .collect();
        Ok(RerankResult::from_rankings(rankings))
    }
}
