use serde::Serialize;

use crate::error::ShapeMismatchError;

/// Queries paired with the passages retrieved for them.
///
/// Row `i` holds the contents, ids and prior retrieval scores of the
/// candidates for `queries[i]`; the three lists always have equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateTable {
    queries: Vec<String>,
    contents: Vec<Vec<String>>,
    ids: Vec<Vec<String>>,
    scores: Vec<Vec<f64>>,
}

impl CandidateTable {
    pub fn new(
        queries: Vec<String>,
        contents: Vec<Vec<String>>,
        ids: Vec<Vec<String>>,
        scores: Vec<Vec<f64>>,
    ) -> Result<Self, ShapeMismatchError> {
        let rows = queries.len();
        check_rows("contents", rows, contents.len())?;
        check_rows("ids", rows, ids.len())?;
        check_rows("scores", rows, scores.len())?;

        for (query, ((c, i), s)) in contents.iter().zip(&ids).zip(&scores).enumerate() {
            if i.len() != c.len() {
                return Err(ShapeMismatchError::Candidates {
                    query,
                    what: "ids",
                    expected: c.len(),
                    found: i.len(),
                });
            }
            if s.len() != c.len() {
                return Err(ShapeMismatchError::Candidates {
                    query,
                    what: "scores",
                    expected: c.len(),
                    found: s.len(),
                });
            }
        }

        Ok(Self {
            queries,
            contents,
            ids,
            scores,
        })
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn contents(&self) -> &[Vec<String>] {
        &self.contents
    }

    pub fn ids(&self) -> &[Vec<String>] {
        &self.ids
    }

    pub fn scores(&self) -> &[Vec<f64>] {
        &self.scores
    }

    pub fn get(&self, index: usize) -> Option<QueryCandidates<'_>> {
        Some(QueryCandidates {
            index,
            query: self.queries.get(index)?,
            contents: self.contents.get(index)?,
            ids: self.ids.get(index)?,
            scores: self.scores.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = QueryCandidates<'_>> {
        (0..self.len()).filter_map(|index| self.get(index))
    }

    /// Largest candidate pool across all queries.
    pub fn max_candidates(&self) -> usize {
        self.contents.iter().map(Vec::len).max().unwrap_or(0)
    }
}

fn check_rows(what: &str, expected: usize, found: usize) -> Result<(), ShapeMismatchError> {
    if expected == found {
        Ok(())
    } else {
        Err(ShapeMismatchError::Rows {
            what: what.to_string(),
            expected,
            found,
        })
    }
}

/// Borrowed view of one query's row in a [`CandidateTable`].
#[derive(Debug, Clone, Copy)]
pub struct QueryCandidates<'a> {
    pub index: usize,
    pub query: &'a str,
    pub contents: &'a [String],
    pub ids: &'a [String],
    pub scores: &'a [f64],
}

impl QueryCandidates<'_> {
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Reranked passages for a single query, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRanking {
    pub contents: Vec<String>,
    pub ids: Vec<String>,
    pub scores: Vec<f64>,
}

impl QueryRanking {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Output of a reranking node: one [`QueryRanking`] per input query, split
/// into the three parallel column lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RerankResult {
    pub contents: Vec<Vec<String>>,
    pub ids: Vec<Vec<String>>,
    pub scores: Vec<Vec<f64>>,
}

impl RerankResult {
    pub fn from_rankings(rankings: Vec<QueryRanking>) -> Self {
        let mut out = Self {
            contents: Vec::with_capacity(rankings.len()),
            ids: Vec::with_capacity(rankings.len()),
            scores: Vec::with_capacity(rankings.len()),
        };
        for ranking in rankings {
            out.contents.push(ranking.contents);
            out.ids.push(ranking.ids);
            out.scores.push(ranking.scores);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn rejects_ragged_candidate_rows() {
        let err = CandidateTable::new(
            strings(&["q1"]),
            vec![strings(&["a", "b"])],
            vec![strings(&["1"])],
            vec![vec![0.1, 0.2]],
        )
        .expect_err("ids shorter than contents");
        assert_eq!(
            err,
            ShapeMismatchError::Candidates {
                query: 0,
                what: "ids",
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn rejects_row_count_mismatch() {
        let err = CandidateTable::new(
            strings(&["q1", "q2"]),
            vec![strings(&["a"])],
            vec![strings(&["1"])],
            vec![vec![0.1]],
        )
        .expect_err("one contents row for two queries");
        assert!(matches!(err, ShapeMismatchError::Rows { expected: 2, found: 1, .. }));
    }

    #[test]
    fn iterates_rows_in_order() {
        let table = CandidateTable::new(
            strings(&["q1", "q2"]),
            vec![strings(&["a", "b", "c"]), strings(&["d"])],
            vec![strings(&["1", "2", "3"]), strings(&["4"])],
            vec![vec![0.1, 0.2, 0.3], vec![0.5]],
        )
        .expect("well-formed table");

        let rows: Vec<_> = table.iter().map(|c| (c.index, c.query, c.len())).collect();
        assert_eq!(rows, vec![(0, "q1", 3), (1, "q2", 1)]);
        assert_eq!(table.max_candidates(), 3);
        assert!(table.get(2).is_none());
    }

    #[test]
    fn result_splits_rankings_into_columns() {
        let result = RerankResult::from_rankings(vec![
            QueryRanking {
                contents: strings(&["c"]),
                ids: strings(&["3"]),
                scores: vec![0.9],
            },
            QueryRanking::default(),
        ]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.ids, vec![strings(&["3"]), Vec::new()]);
    }
}
