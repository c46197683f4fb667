use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::matcher::SelectionPolicy;
use crate::score::CandidateScore;
use crate::similarity::SimilarityMetric;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single cell value as loaded from the host table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text form used for scoring. `Null` has none.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Number(n) => Some(Cow::Owned(format_number(*n))),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Integers print without decimals, everything else in shortest float form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Basket,
    Master,
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basket => write!(f, "basket"),
            Self::Master => write!(f, "master"),
        }
    }
}

/// Ordered, duplicate-free column names shared by every row of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new(kind: CollectionKind, columns: Vec<String>) -> Result<Self, MatchError> {
        let mut seen = std::collections::HashSet::new();
        for c in &columns {
            if !seen.insert(c.as_str()) {
                return Err(MatchError::DuplicateColumn {
                    collection: kind,
                    column: c.clone(),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A basket list or master catalog: one schema, many rows.
///
/// Rows may be shorter than the schema (ragged CSV input); the trailing
/// fields of such a row are absent rather than null.
#[derive(Debug, Clone)]
pub struct Collection {
    kind: CollectionKind,
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Collection {
    pub fn new(kind: CollectionKind, columns: Vec<String>) -> Result<Self, MatchError> {
        Ok(Self {
            kind,
            schema: Schema::new(kind, columns)?,
            rows: Vec::new(),
        })
    }

    pub fn from_rows(
        kind: CollectionKind,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, MatchError> {
        let mut collection = Self::new(kind, columns)?;
        for row in rows {
            collection.push_row(row);
        }
        Ok(collection)
    }

    /// Append a row. Values past the last column have no name and are dropped.
    pub fn push_row(&mut self, mut values: Vec<Value>) {
        if values.len() > self.schema.len() {
            log::debug!(
                "{} row {}: dropping {} value(s) without a column",
                self.kind,
                self.rows.len(),
                values.len() - self.schema.len()
            );
            values.truncate(self.schema.len());
        }
        self.rows.push(values);
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|values| Record {
            schema: &self.schema,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            schema: &self.schema,
            values,
        })
    }
}

/// Borrowed view of one row with its column names.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    schema: &'a Schema,
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Value of a field, `None` when the field is absent from this row.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.schema.position(name).and_then(|i| self.values.get(i))
    }

    /// Present fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn to_fields(&self) -> Vec<(String, Value)> {
        self.fields()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome for one basket record.
#[derive(Debug, Clone)]
pub enum MatchResult<'a> {
    Matched {
        basket: Record<'a>,
        master: Record<'a>,
        master_index: usize,
        score: CandidateScore,
    },
    Unmatched {
        basket: Record<'a>,
        /// Highest candidate score seen during the scan, if any master row was scored.
        best: Option<CandidateScore>,
    },
}

impl<'a> MatchResult<'a> {
    pub fn basket(&self) -> Record<'a> {
        match self {
            Self::Matched { basket, .. } | Self::Unmatched { basket, .. } => *basket,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    pub fn master_index(&self) -> Option<usize> {
        match self {
            Self::Matched { master_index, .. } => Some(*master_index),
            Self::Unmatched { .. } => None,
        }
    }

    /// Combined score of the accepted candidate.
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Matched { score, .. } => Some(score.total),
            Self::Unmatched { .. } => None,
        }
    }

    /// Basket fields with the matched master fields laid over them.
    ///
    /// A master field with the same name replaces the basket value in place;
    /// new names are appended in master order.
    pub fn merged_fields(&self) -> Vec<(String, Value)> {
        match self {
            Self::Unmatched { basket, .. } => basket.to_fields(),
            Self::Matched { basket, master, .. } => {
                let mut fields = basket.to_fields();
                for (name, value) in master.fields() {
                    match fields.iter_mut().find(|(n, _)| n == name) {
                        Some(slot) => slot.1 = value.clone(),
                        None => fields.push((name.to_string(), value.clone())),
                    }
                }
                fields
            }
        }
    }
}

/// Flattened output: union of all row field names, missing cells as `Null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl OutputTable {
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchMeta {
    pub name: String,
    pub threshold: f64,
    pub policy: SelectionPolicy,
    pub similarity: SimilarityMetric,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Matches whose description similarity alone reached 100.
    pub exact_matches: usize,
    /// Matches carried by the phonetic key while the similarity stayed below 100.
    pub phonetic_matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_matched_score: Option<f64>,
}

/// One result per basket record, in basket order.
#[derive(Debug, Clone)]
pub struct MatchOutput<'a> {
    pub meta: MatchMeta,
    pub summary: MatchSummary,
    pub results: Vec<MatchResult<'a>>,
}

impl<'a> MatchOutput<'a> {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Flatten to a common schema. Columns appear in order of first use.
    pub fn to_table(&self) -> OutputTable {
        let merged: Vec<Vec<(String, Value)>> =
            self.results.iter().map(MatchResult::merged_fields).collect();

        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for fields in &merged {
            for (name, _) in fields {
                if !index.contains_key(name) {
                    index.insert(name.clone(), columns.len());
                    columns.push(name.clone());
                }
            }
        }

        let rows = merged
            .into_iter()
            .map(|fields| {
                let mut row = vec![Value::Null; columns.len()];
                for (name, value) in fields {
                    row[index[&name]] = value;
                }
                row
            })
            .collect();

        OutputTable { columns, rows }
    }
}
