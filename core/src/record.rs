use crate::error::{JoinError, Side};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Bound for record identifiers. Blanket-implemented for every type that qualifies.
pub trait RecordId: Clone + Eq + Hash + Ord + Debug + Send + Sync {}

impl<T: Clone + Eq + Hash + Ord + Debug + Send + Sync> RecordId for T {}

/// One input row: a caller-supplied id plus field values, `None` for missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<I> {
    pub id: I,
    pub fields: BTreeMap<String, Option<String>>,
}

impl<I> Record<I> {
    pub fn new(id: I) -> Self { Self { id, fields: BTreeMap::new() } }

    /// Builder-style field setter; `None` marks the value as missing.
    pub fn with<K: Into<String>, V: Into<String>>(mut self, field: K, value: Option<V>) -> Self {
        self.fields.insert(field.into(), value.map(Into::into));
        self
    }

    /// `None` if the record has no such field, `Some(None)` if the field is present but missing a value.
    pub fn get(&self, field: &str) -> Option<Option<&str>> {
        self.fields.get(field).map(|v| v.as_deref())
    }
}

/// A static collection of records sharing one schema.
///
/// Every stored record carries exactly the schema's columns: columns a record lacks on insert
/// are filled with `None`, and columns outside the schema are rejected.
#[derive(Debug, Clone)]
pub struct Dataset<I> {
    side: Side,
    columns: Vec<String>,
    records: Vec<Record<I>>,
}

impl<I> Dataset<I> {
    pub fn new<S: Into<String>>(side: Side, columns: impl IntoIterator<Item = S>) -> Self {
        let mut cols: Vec<String> = Vec::new();
        for c in columns {
            let c = c.into();
            if !cols.contains(&c) { cols.push(c); }
        }
        Self { side, columns: cols, records: Vec::new() }
    }

    pub fn side(&self) -> Side { self.side }
    pub fn columns(&self) -> &[String] { &self.columns }
    pub fn records(&self) -> &[Record<I>] { &self.records }
    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn has_column(&self, field: &str) -> bool { self.columns.iter().any(|c| c == field) }

    pub fn push(&mut self, mut record: Record<I>) -> Result<(), JoinError> {
        if let Some(unknown) = record.fields.keys().find(|k| !self.has_column(k)) {
            return Err(JoinError::InvalidField { field: unknown.clone(), side: self.side });
        }
        for c in &self.columns {
            record.fields.entry(c.clone()).or_insert(None);
        }
        self.records.push(record);
        Ok(())
    }

    /// Fail fast if any of `fields` is not a column of this dataset.
    pub fn require_fields<S: AsRef<str>>(&self, fields: &[S]) -> Result<(), JoinError> {
        match fields.iter().find(|f| !self.has_column(f.as_ref())) {
            Some(f) => Err(JoinError::InvalidField { field: f.as_ref().to_string(), side: self.side }),
            None => Ok(()),
        }
    }
}

impl<I> Dataset<I> {
    /// Build a dataset from records, taking the schema from the union of their fields in first-seen order.
    pub fn from_records(side: Side, records: Vec<Record<I>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for r in &records {
            for k in r.fields.keys() {
                if !columns.contains(k) { columns.push(k.clone()); }
            }
        }
        let mut ds = Self { side, columns, records: Vec::with_capacity(records.len()) };
        for mut r in records {
            for c in &ds.columns {
                r.fields.entry(c.clone()).or_insert(None);
            }
            ds.records.push(r);
        }
        ds
    }
}
