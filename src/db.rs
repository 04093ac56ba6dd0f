use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

pub const DB_FILE: &str = "datatable.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.to_string_lossy()))?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS datasets(
            name TEXT PRIMARY KEY,
            revision INTEGER NOT NULL,
            record_count INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS dataset_records(
            dataset TEXT NOT NULL,
            position INTEGER NOT NULL,
            record_json TEXT NOT NULL,
            PRIMARY KEY(dataset, position),
            FOREIGN KEY(dataset) REFERENCES datasets(name) ON DELETE CASCADE
        )",
        [],
    )?;
    ensure_datasets_record_count(&conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS layouts(
            dataset TEXT PRIMARY KEY,
            columns_json TEXT NOT NULL,
            filters_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS views(
            id TEXT PRIMARY KEY,
            dataset TEXT NOT NULL,
            state_json TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_views_dataset ON views(dataset)",
        [],
    )?;

    Ok(conn)
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(
            serde_json::from_str(&s).with_context(|| format!("corrupt setting {}", key))?,
        )),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, value.to_string()),
    )?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub name: String,
    pub revision: i64,
    pub record_count: i64,
    pub updated_at: String,
}

/// Replaces the whole collection and bumps its revision.
pub fn dataset_put(conn: &mut Connection, name: &str, records: &[Value]) -> anyhow::Result<i64> {
    let tx = conn
        .transaction()
        .context("failed to start dataset transaction")?;
    let current: Option<i64> = tx
        .query_row(
            "SELECT revision FROM datasets WHERE name = ?",
            [name],
            |r| r.get(0),
        )
        .optional()?;
    let revision = current.unwrap_or(0) + 1;
    let now = now_rfc3339();
    tx.execute(
        "INSERT INTO datasets(name, revision, updated_at, record_count) VALUES(?, ?, ?, ?)
         ON CONFLICT(name) DO UPDATE SET
           revision = excluded.revision,
           updated_at = excluded.updated_at,
           record_count = excluded.record_count",
        params![name, revision, now, records.len() as i64],
    )
    .context("failed to upsert dataset")?;
    tx.execute("DELETE FROM dataset_records WHERE dataset = ?", [name])
        .context("failed to clear dataset records")?;
    {
        let mut insert = tx
            .prepare("INSERT INTO dataset_records(dataset, position, record_json) VALUES(?, ?, ?)")
            .context("failed to prepare record insert")?;
        for (position, record) in records.iter().enumerate() {
            insert
                .execute(params![name, position as i64, record.to_string()])
                .context("failed to insert record")?;
        }
    }
    tx.commit().context("failed to commit dataset")?;
    Ok(revision)
}

pub fn dataset_revision(conn: &Connection, name: &str) -> anyhow::Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT revision FROM datasets WHERE name = ?",
            [name],
            |r| r.get(0),
        )
        .optional()?)
}

/// Records in insertion order, or `None` when the dataset does not exist.
pub fn dataset_load(conn: &Connection, name: &str) -> anyhow::Result<Option<(i64, Vec<Value>)>> {
    let Some(revision) = dataset_revision(conn, name)? else {
        return Ok(None);
    };
    let mut stmt = conn.prepare(
        "SELECT record_json FROM dataset_records WHERE dataset = ? ORDER BY position",
    )?;
    let raw = stmt
        .query_map([name], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut records = Vec::with_capacity(raw.len());
    for s in raw {
        records.push(
            serde_json::from_str::<Value>(&s)
                .with_context(|| format!("corrupt record in dataset {}", name))?,
        );
    }
    Ok(Some((revision, records)))
}

pub fn dataset_list(conn: &Connection) -> anyhow::Result<Vec<DatasetSummary>> {
    let mut stmt = conn.prepare(
        "SELECT name, revision, record_count, updated_at FROM datasets ORDER BY name",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(DatasetSummary {
                name: r.get(0)?,
                revision: r.get(1)?,
                record_count: r.get(2)?,
                updated_at: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Removes the dataset with its layout and views.
pub fn dataset_delete(conn: &mut Connection, name: &str) -> anyhow::Result<bool> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM dataset_records WHERE dataset = ?", [name])?;
    tx.execute("DELETE FROM layouts WHERE dataset = ?", [name])?;
    tx.execute("DELETE FROM views WHERE dataset = ?", [name])?;
    let removed = tx.execute("DELETE FROM datasets WHERE name = ?", [name])?;
    tx.commit()?;
    Ok(removed > 0)
}

pub fn layout_set(conn: &Connection, dataset: &str, columns: &Value, filters: &Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO layouts(dataset, columns_json, filters_json, updated_at) VALUES(?, ?, ?, ?)
         ON CONFLICT(dataset) DO UPDATE SET
           columns_json = excluded.columns_json,
           filters_json = excluded.filters_json,
           updated_at = excluded.updated_at",
        params![dataset, columns.to_string(), filters.to_string(), now_rfc3339()],
    )?;
    Ok(())
}

/// `{ columns, filters }` as stored, or `None` when no layout was set.
pub fn layout_get(conn: &Connection, dataset: &str) -> anyhow::Result<Option<Value>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT columns_json, filters_json FROM layouts WHERE dataset = ?",
            [dataset],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((columns, filters)) = row else {
        return Ok(None);
    };
    let columns: Value = serde_json::from_str(&columns).context("corrupt layout columns")?;
    let filters: Value = serde_json::from_str(&filters).context("corrupt layout filters")?;
    Ok(Some(serde_json::json!({ "columns": columns, "filters": filters })))
}

pub fn view_insert(conn: &Connection, id: &str, dataset: &str, state: &Value) -> anyhow::Result<()> {
    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO views(id, dataset, state_json, created_at, updated_at) VALUES(?, ?, ?, ?, ?)",
        params![id, dataset, state.to_string(), now, now],
    )?;
    Ok(())
}

/// `(dataset, state)` of a stored view.
pub fn view_get(conn: &Connection, id: &str) -> anyhow::Result<Option<(String, Value)>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT dataset, state_json FROM views WHERE id = ?",
            [id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((dataset, state)) = row else {
        return Ok(None);
    };
    let state: Value = serde_json::from_str(&state).context("corrupt view state")?;
    Ok(Some((dataset, state)))
}

pub fn view_update(conn: &Connection, id: &str, state: &Value) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE views SET state_json = ?, updated_at = ? WHERE id = ?",
        params![state.to_string(), now_rfc3339(), id],
    )?;
    Ok(changed > 0)
}

pub fn view_delete(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let removed = conn.execute("DELETE FROM views WHERE id = ?", [id])?;
    Ok(removed > 0)
}

// Workspaces created before record counts were tracked lack the column.
fn ensure_datasets_record_count(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "datasets", "record_count")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE datasets ADD COLUMN record_count INTEGER NOT NULL DEFAULT 0",
        [],
    )?;
    conn.execute(
        "UPDATE datasets SET record_count =
           (SELECT COUNT(*) FROM dataset_records r WHERE r.dataset = datasets.name)",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
