//! Moving data between a [`ColumnFrame`] and the reranking table types.

use crate::error::ShapeMismatchError;
use crate::frame::{Column, ColumnFrame};
use crate::table::{CandidateTable, RerankResult};

pub const QUERY_COLUMN: &str = "query";
pub const CONTENTS_COLUMN: &str = "retrieved_contents";
pub const IDS_COLUMN: &str = "retrieved_ids";
pub const SCORES_COLUMN: &str = "retrieve_scores";

/// Column names a reranking node reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerankColumns {
    pub query: String,
    pub contents: String,
    pub ids: String,
    pub scores: String,
}

impl Default for RerankColumns {
    fn default() -> Self {
        Self {
            query: QUERY_COLUMN.to_string(),
            contents: CONTENTS_COLUMN.to_string(),
            ids: IDS_COLUMN.to_string(),
            scores: SCORES_COLUMN.to_string(),
        }
    }
}

/// Reads the query and candidate columns of `frame` into a validated table.
pub fn cast_candidate_table(
    frame: &ColumnFrame,
    columns: &RerankColumns,
) -> Result<CandidateTable, ShapeMismatchError> {
    CandidateTable::new(
        frame.text(&columns.query)?.to_vec(),
        frame.text_lists(&columns.contents)?.to_vec(),
        frame.text_lists(&columns.ids)?.to_vec(),
        frame.score_lists(&columns.scores)?.to_vec(),
    )
}

/// Returns a copy of `frame` with the reranked lists written into the
/// output columns. Columns not named in `columns` are carried over.
pub fn project_rerank_result(
    frame: &ColumnFrame,
    result: &RerankResult,
    columns: &RerankColumns,
) -> Result<ColumnFrame, ShapeMismatchError> {
    let rows = frame.rows();
    for (what, found) in [
        ("reranked contents", result.contents.len()),
        ("reranked ids", result.ids.len()),
        ("reranked scores", result.scores.len()),
    ] {
        if found != rows {
            return Err(ShapeMismatchError::Rows {
                what: what.to_string(),
                expected: rows,
                found,
            });
        }
    }

    for (query, ((c, i), s)) in result
        .contents
        .iter()
        .zip(&result.ids)
        .zip(&result.scores)
        .enumerate()
    {
        if c.len() != i.len() || s.len() != i.len() {
            return Err(ShapeMismatchError::Candidates {
                query,
                what: "reranked contents/scores",
                expected: i.len(),
                found: if c.len() == i.len() { s.len() } else { c.len() },
            });
        }
    }

    let mut out = frame.clone();
    out.insert(columns.contents.clone(), Column::TextList(result.contents.clone()))?;
    out.insert(columns.ids.clone(), Column::TextList(result.ids.clone()))?;
    out.insert(columns.scores.clone(), Column::ScoreList(result.scores.clone()))?;
    Ok(out)
}
