use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::table::config::DEFAULT_PAGE_SIZE;
use serde_json::{json, Map, Value};

const TABLE_KEY: &str = "settings.table";
pub const DEFAULT_MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSettings {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl TableSettings {
    fn to_json(self) -> Value {
        json!({
            "defaultPageSize": self.default_page_size,
            "maxPageSize": self.max_page_size
        })
    }
}

fn parse_usize_range(v: &Value, key: &str, min: usize, max: usize) -> Result<usize, String> {
    let n = v
        .as_u64()
        .ok_or_else(|| format!("{} must be an integer", key))?;
    if n < min as u64 || n > max as u64 {
        return Err(format!("{} must be in range {}..={}", key, min, max));
    }
    Ok(n as usize)
}

fn merge_patch(current: &mut TableSettings, patch: &Map<String, Value>) -> Result<(), String> {
    for (k, v) in patch {
        match k.as_str() {
            "defaultPageSize" => {
                current.default_page_size = parse_usize_range(v, "defaultPageSize", 1, 500)?
            }
            "maxPageSize" => current.max_page_size = parse_usize_range(v, "maxPageSize", 1, 5000)?,
            _ => return Err(format!("unknown table field: {}", k)),
        }
    }
    if current.default_page_size > current.max_page_size {
        return Err("defaultPageSize must not exceed maxPageSize".to_string());
    }
    Ok(())
}

/// Saved table settings over the defaults. A workspace-less daemon runs on
/// defaults.
pub fn load_table_settings(conn: Option<&rusqlite::Connection>) -> anyhow::Result<TableSettings> {
    let mut current = TableSettings::default();
    let Some(conn) = conn else {
        return Ok(current);
    };
    if let Some(saved) = db::settings_get_json(conn, TABLE_KEY)? {
        if let Some(saved_obj) = saved.as_object() {
            let mut candidate = current;
            match merge_patch(&mut candidate, saved_obj) {
                Ok(()) => current = candidate,
                Err(msg) => tracing::warn!(%msg, "ignoring malformed saved table settings"),
            }
        }
    }
    Ok(current)
}

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match load_table_settings(Some(conn)) {
        Ok(table) => ok(&req.id, json!({ "table": table.to_json() })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_table_settings(Some(conn)) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_patch(&mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, TABLE_KEY, &current.to_json()) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "table": current.to_json() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.update" => Some(handle_settings_update(state, req)),
        _ => None,
    }
}
