use crate::cache::QueryScope;
use crate::db;
use crate::ipc::error::{err, ok, table_err};
use crate::ipc::handlers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::table::config::parse_layout;
use crate::table::TableLayout;
use serde_json::{json, Value};

pub(crate) fn load_layout(
    conn: &rusqlite::Connection,
    dataset: &str,
) -> anyhow::Result<Option<TableLayout>> {
    match db::layout_get(conn, dataset)? {
        Some(raw) => Ok(Some(parse_layout(&raw)?)),
        None => Ok(None),
    }
}

fn handle_layouts_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let dataset = match required_str(req, "dataset") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    let raw = json!({
        "columns": req.params.get("columns").cloned().unwrap_or(Value::Null),
        "filters": req.params.get("filters").cloned().unwrap_or(Value::Null),
    });
    let layout = match parse_layout(&raw) {
        Ok(v) => v,
        Err(e) => return table_err(&req.id, e),
    };
    if let Some(column) = layout.columns.iter().find(|c| c.key.trim().is_empty()) {
        return err(
            &req.id,
            "bad_params",
            "columns[].key must not be empty",
            Some(json!({ "column": column })),
        );
    }

    let columns = json!(layout.columns);
    let filters = json!(layout.filters);
    if let Err(e) = db::layout_set(conn, &dataset, &columns, &filters) {
        return err(&req.id, "db_insert_failed", format!("{e:#}"), None);
    }
    // Stored records are unaffected; only processed pages depend on the layout.
    state.cache.invalidate_scope(&dataset, QueryScope::List);
    tracing::info!(
        dataset = %dataset,
        columns = layout.columns.len(),
        filters = layout.filters.len(),
        "layout stored"
    );
    ok(
        &req.id,
        json!({
            "dataset": dataset,
            "columns": columns,
            "filters": filters
        }),
    )
}

fn handle_layouts_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let dataset = match required_str(req, "dataset") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    match load_layout(conn, dataset) {
        Ok(Some(layout)) => ok(
            &req.id,
            json!({
                "dataset": dataset,
                "columns": layout.columns,
                "filters": layout.filters
            }),
        ),
        Ok(None) => err(
            &req.id,
            "not_found",
            format!("no layout for dataset: {}", dataset),
            Some(json!({ "dataset": dataset })),
        ),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "layouts.set" => Some(handle_layouts_set(state, req)),
        "layouts.get" => Some(handle_layouts_get(state, req)),
        _ => None,
    }
}
