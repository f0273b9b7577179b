//! Result Materializer
//!
//! Turns the tabular output of a succeeded execution into records keyed by
//! column label.
//!
//! # Preconditions
//!
//! - The execution is `SUCCEEDED`. Calling this for a running or failed
//!   execution is a caller bug and is not guarded against here.
//! - When [`ResultSet::has_header_row`] is set, the first row holds the column
//!   labels and is not data. Only the first page can carry it.
//!
//! Every record carries the full column set: a missing or null cell becomes
//! `None` (serialized as JSON `null`) instead of being left out.

use crate::engine::{ExecutionHandle, QueryEngine, ResultSet};
use crate::Result;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// One output row as an ordered label → value mapping.
///
/// Labels keep the engine's column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRecord {
    fields: Vec<(String, Option<String>)>,
}

impl NormalizedRecord {
    /// Pairs labels with cells positionally. Short rows are padded with `None`,
    /// cells past the last label are dropped, and a repeated label keeps its
    /// first position but takes the later value.
    pub fn from_row(columns: &[String], cells: &[Option<String>]) -> Self {
        let mut record = NormalizedRecord { fields: Vec::with_capacity(columns.len()) };
        for (i, label) in columns.iter().enumerate() {
            record.insert(label.clone(), cells.get(i).cloned().flatten());
        }
        record
    }

    pub fn insert(&mut self, label: String, value: Option<String>) {
        match self.fields.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((label, value)),
        }
    }

    /// `None` when the label is unknown, `Some(None)` when the cell is null.
    pub fn get(&self, label: &str) -> Option<Option<&str>> {
        self.fields.iter().find(|(existing, _)| existing == label).map(|(_, v)| v.as_deref())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for NormalizedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (label, value) in &self.fields {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Reads a JSON object back in document order.
impl<'de> Deserialize<'de> for NormalizedRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = NormalizedRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column label to string or null")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut record = NormalizedRecord::default();
                while let Some((label, value)) = access.next_entry::<String, Option<String>>()? {
                    record.insert(label, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Flattens a result set into records, preserving row order.
///
/// A result holding only the header row yields an empty vector.
pub fn materialize(result: &ResultSet) -> Vec<NormalizedRecord> {
    let skip = usize::from(result.has_header_row);
    result
        .rows
        .iter()
        .skip(skip)
        .map(|row| NormalizedRecord::from_row(&result.columns, row))
        .collect()
}

/// Fetches the output of a succeeded execution and flattens it.
#[tracing::instrument(level = "debug", skip(engine))]
pub async fn fetch_records(
    engine: &dyn QueryEngine,
    handle: &ExecutionHandle,
) -> Result<Vec<NormalizedRecord>> {
    let result = engine.get_results(handle).await?;
    Ok(materialize(&result))
}
