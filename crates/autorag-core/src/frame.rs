use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ShapeMismatchError;

/// A single named column of a [`ColumnFrame`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum Column {
    Text(Vec<String>),
    TextList(Vec<Vec<String>>),
    ScoreList(Vec<Vec<f64>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(v) => v.len(),
            Self::TextList(v) => v.len(),
            Self::ScoreList(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::TextList(_) => "text_list",
            Self::ScoreList(_) => "score_list",
        }
    }
}

/// Table passed between pipeline nodes: rows addressed through named
/// columns, every column holding one value per row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnFrame {
    columns: BTreeMap<String, Column>,
}

impl ColumnFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ColumnFrame::insert`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<Self, ShapeMismatchError> {
        self.insert(name, column)?;
        Ok(self)
    }

    /// Adds or replaces a column. The column must match the frame's row
    /// count unless it replaces the frame's only column.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<Option<Column>, ShapeMismatchError> {
        let name = name.into();
        let others = self.columns.iter().find(|(n, _)| **n != name);
        if let Some((_, existing)) = others {
            if existing.len() != column.len() {
                return Err(ShapeMismatchError::Rows {
                    what: format!("column `{name}`"),
                    expected: existing.len(),
                    found: column.len(),
                });
            }
        }
        Ok(self.columns.insert(name, column))
    }

    pub fn rows(&self) -> usize {
        self.columns.values().next().map_or(0, Column::len)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn text(&self, name: &str) -> Result<&[String], ShapeMismatchError> {
        match self.require(name)? {
            Column::Text(v) => Ok(v),
            other => Err(type_error(name, "text", other)),
        }
    }

    pub fn text_lists(&self, name: &str) -> Result<&[Vec<String>], ShapeMismatchError> {
        match self.require(name)? {
            Column::TextList(v) => Ok(v),
            other => Err(type_error(name, "text_list", other)),
        }
    }

    pub fn score_lists(&self, name: &str) -> Result<&[Vec<f64>], ShapeMismatchError> {
        match self.require(name)? {
            Column::ScoreList(v) => Ok(v),
            other => Err(type_error(name, "score_list", other)),
        }
    }

    /// Checks that every column has the same number of rows. Frames built
    /// through [`ColumnFrame::insert`] always pass; deserialized ones may not.
    pub fn validate(&self) -> Result<(), ShapeMismatchError> {
        let rows = self.rows();
        for (name, column) in &self.columns {
            if column.len() != rows {
                return Err(ShapeMismatchError::Rows {
                    what: format!("column `{name}`"),
                    expected: rows,
                    found: column.len(),
                });
            }
        }
        Ok(())
    }

    fn require(&self, name: &str) -> Result<&Column, ShapeMismatchError> {
        self.columns
            .get(name)
            .ok_or_else(|| ShapeMismatchError::MissingColumn(name.to_string()))
    }
}

fn type_error(name: &str, expected: &'static str, found: &Column) -> ShapeMismatchError {
    ShapeMismatchError::ColumnType {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}
