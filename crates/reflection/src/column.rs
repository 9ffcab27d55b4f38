//! Column references, keys and projections

use std::fmt;

use serde::{Deserialize, Serialize};

/// A column name, optionally qualified by a table
///
/// The textual form `table__column` parses to a qualified reference, so
/// `"blah__blah"` names the column `blah` of table `blah`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    /// An unqualified column
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    /// A column qualified by its table
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// Parse the `table__column` shorthand
    pub fn parse(text: &str) -> Self {
        match text.split_once("__") {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                Self::qualified(table, column)
            }
            _ => Self::new(text),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.table.is_some()
    }
}

impl From<&str> for ColumnRef {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for ColumnRef {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.column),
            None => f.write_str(&self.column),
        }
    }
}

/// One or more columns forming a primary or foreign key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    columns: Vec<ColumnRef>,
}

impl Key {
    /// A single-column key
    pub fn simple(column: impl Into<ColumnRef>) -> Self {
        Self {
            columns: vec![column.into()],
        }
    }

    /// A composite key; column order is significant
    pub fn composite<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<&str> for Key {
    fn from(column: &str) -> Self {
        Self::simple(column)
    }
}

impl From<String> for Key {
    fn from(column: String) -> Self {
        Self::simple(column)
    }
}

impl From<ColumnRef> for Key {
    fn from(column: ColumnRef) -> Self {
        Self::simple(column)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [column] = self.columns.as_slice() {
            return write!(f, "{}", column);
        }

        f.write_str("(")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", column)?;
        }
        f.write_str(")")
    }
}

/// Column selection used by queries built through a relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// An explicit list of columns
    Columns(Vec<ColumnRef>),
    /// Every column of one table (`table.*`)
    AllColumnsOf(String),
}

impl Projection {
    pub fn columns<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        Self::Columns(columns.into_iter().map(Into::into).collect())
    }

    pub fn all_of(table: impl Into<String>) -> Self {
        Self::AllColumnsOf(table.into())
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllColumnsOf(table) => write!(f, "{}.*", table),
            Self::Columns(columns) => {
                let rendered: Vec<String> = columns.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join(", "))
            }
        }
    }
}
