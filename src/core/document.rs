// In-memory document model: table name to ordered record sequence.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single row: field name to JSON value.
pub type Record = Map<String, Value>;

/// The whole persisted structure. Tables are kept sorted by name; records keep
/// insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    tables: BTreeMap<String, Vec<Record>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document holding one empty table, the shape written on first use.
    pub fn with_table(name: &str) -> Self {
        let mut document = Self::new();
        document.insert_table(name);
        document
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table(&self, name: &str) -> Option<&[Record]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.tables
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Returns `true` when the table was absent and got created.
    pub fn insert_table(&mut self, name: &str) -> bool {
        if self.tables.contains_key(name) {
            return false;
        }
        self.tables.insert(name.to_string(), Vec::new());
        true
    }

    pub fn replace_table(&mut self, name: &str, records: Vec<Record>) {
        self.tables.insert(name.to_string(), records);
    }

    pub fn to_value(&self) -> Value {
        let tables = self
            .tables()
            .map(|(name, records)| {
                let rows = records.iter().cloned().map(Value::Object).collect();
                (name.to_string(), Value::Array(rows))
            })
            .collect::<Map<String, Value>>();
        Value::Object(tables)
    }
}
