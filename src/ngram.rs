//! Frequency tables over n-grams and keywords.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clean::clean_keyword;
use crate::error::{Error, Result};
use crate::record::Record;

/// N-gram order, always 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct NgramOrder(usize);

impl NgramOrder {
    pub const ALL: [NgramOrder; 3] = [NgramOrder(1), NgramOrder(2), NgramOrder(3)];

    pub fn new(n: usize) -> Result<Self> {
        if (1..=3).contains(&n) {
            Ok(Self(n))
        } else {
            Err(Error::InvalidArgument(format!(
                "n-gram order must be 1, 2 or 3, got {n}"
            )))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for NgramOrder {
    type Error = Error;

    fn try_from(n: usize) -> Result<Self> {
        Self::new(n)
    }
}

impl From<NgramOrder> for usize {
    fn from(order: NgramOrder) -> usize {
        order.0
    }
}

impl fmt::Display for NgramOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether n-gram windows may cross from one record into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowMode {
    /// Windows stay inside a single record
    #[default]
    PerRecord,
    /// All records form one token stream (legacy behaviour)
    Corpus,
}

/// What the keys of a histogram are, which also fixes the field name used
/// when it is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramKind {
    Ngram,
    Keyword,
}

impl HistogramKind {
    pub fn field_name(self) -> &'static str {
        match self {
            HistogramKind::Ngram => "n-gram",
            HistogramKind::Keyword => "keyword",
        }
    }
}

/// Occurrence counts keyed by n-gram or keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>) {
        *self.counts.entry(key.into()).or_insert(0) += 1;
    }

    /// Adds `count` occurrences of `key` at once.
    pub fn add_count(&mut self, key: impl Into<String>, count: u64) {
        *self.counts.entry(key.into()).or_insert(0) += count;
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entries by descending count, ties broken alphabetically.
    ///
    /// # Example
    /// ```
    /// use bibliostat::FrequencyTable;
    /// let mut table = FrequencyTable::new();
    /// for w in ["two", "one", "two", "three", "three", "three"] {
    ///     table.add(w);
    /// }
    /// let expected = vec![
    ///     ("three".to_string(), 3),
    ///     ("two".to_string(), 2),
    ///     ("one".to_string(), 1),
    /// ];
    /// assert_eq!(table.sorted(), expected);
    /// ```
    pub fn sorted(&self) -> Vec<(String, u64)> {
        let mut sorted: Vec<(String, u64)> =
            self.counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }
}

/// Counts the n-grams of a single token stream.
pub fn aggregate(tokens: &[String], n: usize) -> Result<FrequencyTable> {
    let order = NgramOrder::new(n)?;
    let mut table = FrequencyTable::new();
    count_windows(&mut table, tokens, order);
    Ok(table)
}

/// Counts n-grams over per-record token streams. With
/// [`WindowMode::PerRecord`] no window spans two streams; with
/// [`WindowMode::Corpus`] the streams are chained first.
pub fn aggregate_units(
    units: &[Vec<String>],
    order: NgramOrder,
    window: WindowMode,
) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    match window {
        WindowMode::PerRecord => {
            for tokens in units {
                count_windows(&mut table, tokens, order);
            }
        }
        WindowMode::Corpus => {
            let stream: Vec<String> = units.iter().flatten().cloned().collect();
            count_windows(&mut table, &stream, order);
        }
    }
    table
}

fn count_windows(table: &mut FrequencyTable, tokens: &[String], order: NgramOrder) {
    for window in tokens.windows(order.get()) {
        table.add(window.join(" "));
    }
}

/// Histogram of cleaned keywords across all records. Keywords that are
/// empty after cleaning are not counted.
pub fn keyword_histogram(records: &[Record]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    for keyword in records.iter().flat_map(Record::keywords) {
        let cleaned = clean_keyword(&keyword);
        if !cleaned.is_empty() {
            table.add(cleaned);
        }
    }
    table
}
