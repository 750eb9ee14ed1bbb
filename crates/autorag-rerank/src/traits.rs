use async_trait::async_trait;
use autorag_core::{
    CandidateTable, ColumnFrame, RerankColumns, RerankResult, cast_candidate_table,
    project_rerank_result,
};

use crate::error::{ProviderError, RerankError};
use crate::types::{RerankRequest, RerankResponse};

/// A vendor backend that scores the documents of a single query.
#[async_trait]
pub trait RerankProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn rerank(&self, request: RerankRequest) -> Result<RerankResponse, ProviderError>;
}

/// A reranking node: reorders every query's candidates and keeps the best
/// `top_k` of them.
#[async_trait]
pub trait PassageReranker: Send + Sync {
    fn name(&self) -> &str;

    async fn rerank(
        &self,
        table: &CandidateTable,
        top_k: usize,
    ) -> Result<RerankResult, RerankError>;

    /// Reads the candidate columns of `frame`, reranks them and returns the
    /// frame with the result columns replaced.
    async fn run(&self, frame: &ColumnFrame, top_k: usize) -> Result<ColumnFrame, RerankError> {
        let columns = RerankColumns::default();
        let table = cast_candidate_table(frame, &columns)?;
        let result = self.rerank(&table, top_k).await?;
        Ok(project_rerank_result(frame, &result, &columns)?)
    }
}
