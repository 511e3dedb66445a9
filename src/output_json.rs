//! Purpose: Shared JSON envelopes for CLI stdout payloads.
//! Exports: `records_json`, `page_json`, `record_or_null`, `count_json`.
//! Role: Keep output shapes consistent across subcommands.
//! Invariants: Stable key names for v0 payloads; fields are additive-only.
//! Invariants: Page schema keys mirror the library's `PageSchema` field names.

use jsondb::api::{Page, PageSchema, Record};
use serde_json::{Map, Value, json};

pub(crate) fn records_json(table: &str, records: &[Record]) -> Value {
    let rows = records.iter().cloned().map(Value::Object).collect::<Vec<_>>();
    let mut map = Map::new();
    map.insert("table".to_string(), json!(table));
    map.insert("count".to_string(), json!(rows.len()));
    map.insert("records".to_string(), Value::Array(rows));
    Value::Object(map)
}

pub(crate) fn record_or_null(record: Option<Record>) -> Value {
    record.map(Value::Object).unwrap_or(Value::Null)
}

pub(crate) fn count_json(table: &str, count: usize) -> Value {
    json!({ "table": table, "count": count })
}

pub(crate) fn page_json(page: &Page) -> Value {
    let rows = page.data.iter().cloned().map(Value::Object).collect::<Vec<_>>();
    let mut map = Map::new();
    map.insert("data".to_string(), Value::Array(rows));
    map.insert("schema".to_string(), schema_json(page.schema));
    Value::Object(map)
}

fn schema_json(schema: PageSchema) -> Value {
    json!({
        "current_page": schema.current_page,
        "next_page": schema.next_page,
        "previous_page": schema.previous_page,
    })
}

#[cfg(test)]
mod tests {
    use super::{page_json, record_or_null, records_json};
    use jsondb::api::Page;
    use serde_json::{Value, json};

    #[test]
    fn page_envelope_has_schema() {
        let row = json!({"id": 3}).as_object().cloned().expect("object");
        let value = page_json(&Page::new(vec![row], 2));
        assert_eq!(
            value,
            json!({
                "data": [{"id": 3}],
                "schema": {"current_page": 2, "next_page": 3, "previous_page": 1},
            })
        );
    }

    #[test]
    fn first_page_previous_is_null() {
        let value = page_json(&Page::new(Vec::new(), 1));
        assert_eq!(value["schema"]["previous_page"], Value::Null);
    }

    #[test]
    fn records_envelope_counts_rows() {
        let row = json!({"id": 1}).as_object().cloned().expect("object");
        let value = records_json("users", &[row]);
        assert_eq!(value["table"], "users");
        assert_eq!(value["count"], 1);
        assert_eq!(record_or_null(None), Value::Null);
    }
}
