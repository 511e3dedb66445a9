//! Purpose: Hold top-level CLI command dispatch for `jsondb`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Each command opens one fresh `Query` session.
//! Invariants: `--where` conditions apply in the order given before the view runs.

use super::*;
use crate::output_json::{count_json, page_json, record_or_null, records_json};
use jsondb::api::Query;

pub(super) fn dispatch_command(command: Command, db: &JsonDb) -> Result<RunOutcome, Error> {
    match command {
        Command::All => {
            emit_json(db.all()?.to_value());
        }
        Command::Get { table, filter } => {
            let mut query = open_query(db, &table, &filter)?;
            let records = query.get()?;
            emit_json(records_json(&table.table, records));
        }
        Command::Create { table, data } => {
            let record = parse_record(&data)?;
            let created = open_query(db, &table, &WhereArgs::none())?.create(record)?;
            emit_json(Value::Object(created));
        }
        Command::Update { table, id, data } => {
            let patch = parse_record(&data)?;
            let updated = open_query(db, &table, &WhereArgs::none())?
                .update(parse_value(&id), patch)?;
            emit_json(record_or_null(updated));
        }
        Command::Find { table, id } => {
            let found = open_query(db, &table, &WhereArgs::none())?.find(parse_value(&id))?;
            emit_json(record_or_null(found));
        }
        Command::Delete { table, id } => {
            let deleted = open_query(db, &table, &WhereArgs::none())?.delete(parse_value(&id))?;
            emit_json(json!({ "table": table.table, "deleted": deleted }));
        }
        Command::First { table, filter } => {
            let first = open_query(db, &table, &filter)?.first()?;
            emit_json(Value::Object(first));
        }
        Command::Last { table, filter } => {
            let last = open_query(db, &table, &filter)?.last()?;
            emit_json(record_or_null(last));
        }
        Command::Count { table, filter } => {
            let count = open_query(db, &table, &filter)?.count()?;
            emit_json(count_json(&table.table, count));
        }
        Command::CountOf {
            table,
            column,
            value,
            filter,
        } => {
            let count = open_query(db, &table, &filter)?.count_of(&column, parse_value(&value))?;
            emit_json(count_json(&table.table, count));
        }
        Command::Paginate {
            table,
            size,
            page,
            filter,
        } => {
            let page = open_query(db, &table, &filter)?.paginate(size, page)?;
            emit_json(page_json(&page));
        }
        Command::LastId { table } => {
            let last_id = open_query(db, &table, &WhereArgs::none())?.last_id()?;
            emit_json(json!({ "table": table.table, "last_id": last_id }));
        }
        Command::Clean => {
            db.clean()?;
            emit_json(json!({ "cleaned": db.path().display().to_string() }));
        }
    }
    Ok(RunOutcome::ok())
}

fn open_query<'db>(
    db: &'db JsonDb,
    table: &TableArgs,
    filter: &WhereArgs,
) -> Result<Query<'db>, Error> {
    let mut query = db
        .table(table.table.as_str())
        .with_primary_key(table.primary_key.as_str());
    for condition in filter.conditions.chunks(3) {
        let [column, operator, value] = condition else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("--where takes exactly three values")
                .with_hint("Use --where COLUMN OP VALUE, e.g. --where age '>' 30."));
        };
        query.filter(column, operator, parse_value(value))?;
    }
    Ok(query)
}

impl WhereArgs {
    fn none() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }
}
