//! Purpose: Per-table query session implementing record CRUD and derived views.
//! Exports: `Query`, `DEFAULT_PRIMARY_KEY`.
//! Role: Explicit session state (table, primary key, predicates, cached set).
//! Invariants: Every operation runs under the store lock and ensures file and table exist.
//! Invariants: Mutations and id lookups read the full table fresh, never the filtered set.
//! Invariants: Mutations drop the cached set; predicates survive and are re-applied.

use serde_json::Value;
use tracing::debug;

use crate::api::page::Page;
use crate::core::document::{Document, Record};
use crate::core::error::{Error, ErrorKind};
use crate::core::predicate::{Predicate, loose_eq};
use crate::core::store::{DocumentStore, StoreLock};
use crate::core::table::TableAccessor;

pub const DEFAULT_PRIMARY_KEY: &str = "id";

#[derive(Debug)]
pub struct Query<'db> {
    store: &'db DocumentStore,
    table: String,
    primary_key: String,
    predicates: Vec<Predicate>,
    records: Option<Vec<Record>>,
}

impl<'db> Query<'db> {
    pub(crate) fn new(store: &'db DocumentStore, table: String) -> Self {
        Self {
            store,
            table,
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            predicates: Vec::new(),
            records: None,
        }
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_materialized(&self) -> bool {
        self.records.is_some()
    }

    /// Drops applied predicates and the cached set.
    pub fn reset(&mut self) {
        self.predicates.clear();
        self.records = None;
    }

    pub fn all(&self) -> Result<Document, Error> {
        let (_lock, tables) = self.open_table()?;
        Ok(tables.into_document())
    }

    /// Current record set: the table after every predicate applied so far.
    pub fn get(&mut self) -> Result<&[Record], Error> {
        if self.records.is_none() {
            let records = self.materialize()?;
            self.records = Some(records);
        }
        Ok(self.records.as_deref().unwrap_or_default())
    }

    /// Narrows the current set to records where `record[column] <operator> value`.
    /// A second call filters the already-filtered set.
    pub fn filter(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, Error> {
        let predicate = Predicate::parse(column, operator, value)
            .map_err(|err| err.with_table(&self.table))?;
        self.get()?;
        if let Some(records) = self.records.as_mut() {
            predicate.apply(records);
        }
        debug!(table = %self.table, predicate = %predicate, "applied filter");
        self.predicates.push(predicate);
        Ok(self)
    }

    pub fn create(&mut self, mut data: Record) -> Result<Record, Error> {
        let (_lock, mut tables) = self.open_table()?;
        let mut records = tables.get_table(&self.table)?.to_vec();

        match data.get(&self.primary_key).cloned() {
            Some(id) => {
                if position_of(&records, &self.primary_key, &id).is_some() {
                    return Err(Error::new(ErrorKind::DuplicatedId)
                        .with_message(format!("duplicated id {id}"))
                        .with_hint(format!(
                            "Omit `{}` to get the next id assigned automatically.",
                            self.primary_key
                        ))
                        .with_table(&self.table));
                }
            }
            None => {
                let next = next_id(&records, &self.primary_key, &self.table)?;
                data.insert(self.primary_key.clone(), Value::from(next));
            }
        }

        records.push(data.clone());
        tables.rewrite_table(&self.table, records)?;
        self.records = None;
        let created_id = data.get(&self.primary_key).cloned().unwrap_or(Value::Null);
        debug!(table = %self.table, id = %created_id, "created record");
        Ok(data)
    }

    /// Merges `data` into the first record whose key equals `id`. The primary
    /// key itself never changes.
    pub fn update(&mut self, id: impl Into<Value>, data: Record) -> Result<Option<Record>, Error> {
        let id = id.into();
        let (_lock, mut tables) = self.open_table()?;
        let mut records = tables.get_table(&self.table)?.to_vec();
        let Some(index) = position_of(&records, &self.primary_key, &id) else {
            return Ok(None);
        };

        let record = &mut records[index];
        for (key, value) in data {
            if key != self.primary_key {
                record.insert(key, value);
            }
        }
        let updated = record.clone();

        tables.rewrite_table(&self.table, records)?;
        self.records = None;
        debug!(table = %self.table, id = %id, "updated record");
        Ok(Some(updated))
    }

    pub fn find(&self, id: impl Into<Value>) -> Result<Option<Record>, Error> {
        let id = id.into();
        let (_lock, tables) = self.open_table()?;
        let records = tables.get_table(&self.table)?;
        Ok(position_of(records, &self.primary_key, &id).map(|index| records[index].clone()))
    }

    pub fn delete(&mut self, id: impl Into<Value>) -> Result<bool, Error> {
        let id = id.into();
        let (_lock, mut tables) = self.open_table()?;
        let mut records = tables.get_table(&self.table)?.to_vec();
        let Some(index) = position_of(&records, &self.primary_key, &id) else {
            return Ok(false);
        };

        records.remove(index);
        tables.rewrite_table(&self.table, records)?;
        self.records = None;
        debug!(table = %self.table, id = %id, "deleted record");
        Ok(true)
    }

    /// Primary key of the last record in table order, or 0 for an empty table.
    pub fn last_id(&self) -> Result<i64, Error> {
        let (_lock, tables) = self.open_table()?;
        last_id_of(tables.get_table(&self.table)?, &self.primary_key, &self.table)
    }

    pub fn first(&mut self) -> Result<Record, Error> {
        let first = self.get()?.first().cloned();
        first.ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message("no records")
                .with_table(&self.table)
        })
    }

    /// `None` when there are no records.
    pub fn last(&mut self) -> Result<Option<Record>, Error> {
        Ok(self.get()?.last().cloned())
    }

    pub fn count(&mut self) -> Result<usize, Error> {
        Ok(self.get()?.len())
    }

    /// Records whose `column` equals `value`; zero matches is `NotFound`.
    pub fn count_of(&mut self, column: &str, value: impl Into<Value>) -> Result<usize, Error> {
        let value = value.into();
        let count = self
            .get()?
            .iter()
            .filter(|record| {
                record
                    .get(column)
                    .is_some_and(|field| loose_eq(field, &value))
            })
            .count();
        if count == 0 {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message(format!("no record has {column} = {value}"))
                .with_table(&self.table));
        }
        Ok(count)
    }

    pub fn paginate(&mut self, size: usize, page: usize) -> Result<Page, Error> {
        if size == 0 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("page size must be at least 1")
                .with_table(&self.table));
        }
        if page == 0 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("pages are numbered from 1")
                .with_table(&self.table));
        }

        let (chunk, total) = {
            let records = self.get()?;
            let chunk = records.chunks(size).nth(page - 1).map(<[Record]>::to_vec);
            (chunk, records.len())
        };
        let Some(data) = chunk else {
            let pages = total.div_ceil(size);
            return Err(Error::new(ErrorKind::OutOfRange)
                .with_message(format!("page {page} is out of range"))
                .with_hint(format!(
                    "{total} record(s) make {pages} page(s) of size {size}."
                ))
                .with_table(&self.table));
        };
        Ok(Page::new(data, page))
    }

    fn open_table(&self) -> Result<(StoreLock, TableAccessor<'db>), Error> {
        let lock = self.store.lock()?;
        self.store.ensure_exists(&self.table)?;
        let mut tables = TableAccessor::load(self.store)?;
        tables.ensure_table(&self.table)?;
        Ok((lock, tables))
    }

    fn materialize(&self) -> Result<Vec<Record>, Error> {
        let (_lock, tables) = self.open_table()?;
        let mut records = tables.get_table(&self.table)?.to_vec();
        for predicate in &self.predicates {
            predicate.apply(&mut records);
        }
        Ok(records)
    }
}

/// First record whose primary key equals `id`; records without the key are skipped.
fn position_of(records: &[Record], primary_key: &str, id: &Value) -> Option<usize> {
    records.iter().position(|record| {
        record
            .get(primary_key)
            .is_some_and(|value| loose_eq(value, id))
    })
}

fn last_id_of(records: &[Record], primary_key: &str, table: &str) -> Result<i64, Error> {
    let Some(last) = records.last() else {
        return Ok(0);
    };
    let value = last.get(primary_key).unwrap_or(&Value::Null);
    integer_id(value).ok_or_else(|| {
        Error::new(ErrorKind::Usage)
            .with_message(format!(
                "cannot auto-increment: last `{primary_key}` is {value}, not an integer"
            ))
            .with_hint(format!("Supply `{primary_key}` explicitly for this table."))
            .with_table(table)
    })
}

fn next_id(records: &[Record], primary_key: &str, table: &str) -> Result<i64, Error> {
    last_id_of(records, primary_key, table)?
        .checked_add(1)
        .ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("primary key space exhausted")
                .with_table(table)
        })
}

fn integer_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
