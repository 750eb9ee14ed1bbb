use thiserror::Error;

/// Raised when parallel sequences in a table or frame disagree in length,
/// or when a frame lacks a column a node needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeMismatchError {
    #[error("{what}: expected {expected} rows, found {found}")]
    Rows {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("query {query}: {what} has {found} entries, expected {expected}")]
    Candidates {
        query: usize,
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("column `{0}` is missing")]
    MissingColumn(String),

    #[error("column `{name}` holds {found}, expected {expected}")]
    ColumnType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}
