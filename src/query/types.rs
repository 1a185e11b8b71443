//! Query Data Types

use crate::storage::record::Record;
use serde::Serialize;

/// Identifiers parsed from a request path segment.
///
/// `plural` records whether the raw argument contained a comma. It decides the response shape,
/// independently of how many identifiers survive parsing: `a1` answers with an object, while
/// `a1,`, `,a1` and `a1,a2` answer with an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSelector {
    pub ids: Vec<String>,
    pub plural: bool,
}

impl IdSelector {
    pub fn parse(raw: &str) -> Self {
        Self {
            ids: raw
                .split(',')
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
            plural: raw.contains(','),
        }
    }

    /// Path segment that always asks for an array, whatever the number of ids.
    pub fn array_argument(ids: &[String]) -> String {
        format!(",{}", ids.join(","))
    }
}

/// Public-facing result of an identifier query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    One(Record),
    Many(Vec<Record>),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            QueryResult::One(_) => 1,
            QueryResult::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
