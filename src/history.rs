//! Edit history recording and querying.
//!
//! Every public mutation appends zero or more rows here in the same
//! transaction as the data change: CREATE and DELETE record one row per
//! entity with an optional JSON snapshot, UPDATE records one row per
//! changed scalar field with JSON-encoded old/new values.

use rusqlite::{Connection, params};
use serde_json::Value;

use crate::error::Result;
use crate::models::{EditOperation, EditRecord};

/// Record a CREATE operation.
pub(crate) fn record_create(
    conn: &Connection,
    entity_kind: &str,
    entity_id: &str,
    snapshot: Option<Value>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO edit_history (entity_type, entity_id, operation, new_value) \
         VALUES (?1, ?2, 'CREATE', ?3)",
        params![entity_kind, entity_id, snapshot.map(|v| v.to_string())],
    )?;
    Ok(())
}

/// Record an UPDATE operation for one changed field.
pub(crate) fn record_update(
    conn: &Connection,
    entity_kind: &str,
    entity_id: &str,
    field: &str,
    old_value: Value,
    new_value: Value,
) -> Result<()> {
    conn.execute(
        "INSERT INTO edit_history \
         (entity_type, entity_id, field_name, operation, old_value, new_value) \
         VALUES (?1, ?2, ?3, 'UPDATE', ?4, ?5)",
        params![
            entity_kind,
            entity_id,
            field,
            old_value.to_string(),
            new_value.to_string()
        ],
    )?;
    Ok(())
}

/// Record a DELETE operation.
pub(crate) fn record_delete(
    conn: &Connection,
    entity_kind: &str,
    entity_id: &str,
    snapshot: Option<Value>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO edit_history (entity_type, entity_id, operation, old_value) \
         VALUES (?1, ?2, 'DELETE', ?3)",
        params![entity_kind, entity_id, snapshot.map(|v| v.to_string())],
    )?;
    Ok(())
}

/// Filters for querying the edit history. Unset fields do not constrain
/// the query.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub entity_kind: Option<String>,
    pub entity_id: Option<String>,
    /// Exclusive lower bound on the ISO-8601 timestamp.
    pub since: Option<String>,
    pub operation: Option<EditOperation>,
}

/// Query edit history, ordered ascending by timestamp.
pub(crate) fn query(conn: &Connection, filter: &HistoryFilter) -> Result<Vec<EditRecord>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(kind) = &filter.entity_kind {
        clauses.push("entity_type = ?");
        params.push(kind.clone());
    }
    if let Some(id) = &filter.entity_id {
        clauses.push("entity_id = ?");
        params.push(id.clone());
    }
    if let Some(since) = &filter.since {
        clauses.push("timestamp > ?");
        params.push(since.clone());
    }
    if let Some(op) = filter.operation {
        clauses.push("operation = ?");
        params.push(op.as_str().to_string());
    }

    let where_clause = if clauses.is_empty() {
        "1=1".to_string()
    } else {
        clauses.join(" AND ")
    };
    let sql = format!(
        "SELECT rowid, entity_type, entity_id, field_name, operation, \
         old_value, new_value, timestamp \
         FROM edit_history WHERE {where_clause} ORDER BY timestamp ASC, rowid ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, entity_kind, entity_id, field, op, old_value, new_value, timestamp) = row?;
        records.push(EditRecord {
            id,
            entity_kind,
            entity_id,
            field,
            operation: op.parse()?,
            old_value,
            new_value,
            timestamp,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_conn() -> Connection {
        let conn = db::connect_in_memory().unwrap();
        db::init_db(&conn).unwrap();
        conn
    }

    #[test]
    fn test_record_and_query() {
        let conn = test_conn();
        record_create(&conn, "synset", "awn-00000001-n", None).unwrap();
        record_update(
            &conn,
            "synset",
            "awn-00000001-n",
            "pos",
            Value::from("n"),
            Value::from("v"),
        )
        .unwrap();
        record_delete(&conn, "synset", "awn-00000001-n", None).unwrap();

        let all = query(&conn, &HistoryFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].operation, EditOperation::Create);
        assert_eq!(all[1].field.as_deref(), Some("pos"));
        assert_eq!(all[1].old_value.as_deref(), Some("\"n\""));
        assert_eq!(all[1].new_value.as_deref(), Some("\"v\""));
        assert_eq!(all[2].operation, EditOperation::Delete);
    }

    #[test]
    fn test_filters() {
        let conn = test_conn();
        record_create(&conn, "synset", "s1", None).unwrap();
        record_create(&conn, "entry", "e1", None).unwrap();
        record_delete(&conn, "entry", "e1", None).unwrap();

        let filter = HistoryFilter {
            entity_kind: Some("entry".into()),
            ..Default::default()
        };
        assert_eq!(query(&conn, &filter).unwrap().len(), 2);

        let filter = HistoryFilter {
            operation: Some(EditOperation::Delete),
            ..Default::default()
        };
        let deletes = query(&conn, &filter).unwrap();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].entity_id, "e1");
    }

    #[test]
    fn test_since_filter_is_exclusive() {
        let conn = test_conn();
        record_create(&conn, "synset", "s1", None).unwrap();
        let first = &query(&conn, &HistoryFilter::default()).unwrap()[0];
        let filter = HistoryFilter {
            since: Some(first.timestamp.clone()),
            ..Default::default()
        };
        // A record at exactly the bound is excluded.
        assert!(query(&conn, &filter).unwrap().is_empty());
    }
}
