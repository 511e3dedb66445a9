// Named-table access over a document snapshot; every change persists the whole file.
use tracing::debug;

use crate::core::document::{Document, Record};
use crate::core::error::{Error, ErrorKind};
use crate::core::store::DocumentStore;

/// Holds the latest document snapshot read from `store`. Callers are expected
/// to hold the store lock for as long as the accessor lives.
pub struct TableAccessor<'a> {
    store: &'a DocumentStore,
    latest: Document,
}

impl<'a> TableAccessor<'a> {
    pub fn load(store: &'a DocumentStore) -> Result<Self, Error> {
        let latest = store.read_all()?;
        Ok(Self { store, latest })
    }

    pub fn document(&self) -> &Document {
        &self.latest
    }

    pub fn into_document(self) -> Document {
        self.latest
    }

    /// Inserts an empty table under `name` when missing and persists the result.
    pub fn ensure_table(&mut self, name: &str) -> Result<&Document, Error> {
        if self.latest.insert_table(name) {
            debug!(table = name, "creating table");
            self.save()?;
        }
        Ok(&self.latest)
    }

    pub fn get_table(&self, name: &str) -> Result<&[Record], Error> {
        self.latest.table(name).ok_or_else(|| {
            Error::new(ErrorKind::UnknownTable)
                .with_message("table does not exist")
                .with_table(name)
                .with_path(self.store.path())
        })
    }

    /// Replaces the table wholesale; other tables are untouched.
    pub fn rewrite_table(&mut self, name: &str, records: Vec<Record>) -> Result<(), Error> {
        debug!(table = name, records = records.len(), "rewriting table");
        self.latest.replace_table(name, records);
        self.save()
    }

    pub fn save(&self) -> Result<(), Error> {
        self.store.write_all(&self.latest)
    }
}

#[cfg(test)]
mod tests {
    use super::TableAccessor;
    use crate::core::document::Record;
    use crate::core::error::ErrorKind;
    use crate::core::store::DocumentStore;
    use serde_json::{Value, json};

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object")
    }

    fn seeded_store(dir: &tempfile::TempDir, content: &str) -> DocumentStore {
        let store = DocumentStore::new(dir.path().join("db.json"));
        std::fs::write(store.path(), content).expect("seed");
        store
    }

    #[test]
    fn ensure_table_persists_new_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(&dir, r#"{"posts":[]}"#);

        let mut tables = TableAccessor::load(&store).expect("load");
        let document = tables.ensure_table("users").expect("ensure");
        assert!(document.contains_table("users"));

        let on_disk = store.read_all().expect("read");
        assert!(on_disk.contains_table("users"));
        assert!(on_disk.contains_table("posts"));
    }

    #[test]
    fn ensure_table_recovers_cleared_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(&dir, "");

        let mut tables = TableAccessor::load(&store).expect("load");
        tables.ensure_table("users").expect("ensure");
        assert_eq!(tables.get_table("users").expect("table").len(), 0);
        assert!(store.read_all().expect("read").contains_table("users"));
    }

    #[test]
    fn missing_table_is_unknown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(&dir, r#"{"posts":[]}"#);

        let tables = TableAccessor::load(&store).expect("load");
        let err = tables.get_table("users").expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::UnknownTable);
        assert_eq!(err.table(), Some("users"));
    }

    #[test]
    fn rewrite_table_leaves_other_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(
            &dir,
            r#"{"posts":[{"id":7}],"users":[{"id":1},{"id":2},{"id":3}]}"#,
        );

        let mut tables = TableAccessor::load(&store).expect("load");
        let kept = vec![record(json!({"id": 1})), record(json!({"id": 3}))];
        tables.rewrite_table("users", kept.clone()).expect("rewrite");

        let on_disk = store.read_all().expect("read");
        assert_eq!(on_disk.table("users"), Some(kept.as_slice()));
        assert_eq!(on_disk.table("posts"), Some(&[record(json!({"id": 7}))][..]));
    }
}
