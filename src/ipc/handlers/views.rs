use crate::db;
use crate::ipc::error::{err, ok, table_err};
use crate::ipc::handlers::datasets::load_records;
use crate::ipc::handlers::layouts::load_layout;
use crate::ipc::handlers::required_str;
use crate::ipc::handlers::settings::load_table_settings;
use crate::ipc::types::{AppState, Request};
use crate::table::{self, paginate, PageOutput, PluginRegistry, TableLayout};
use crate::view::{parse_action, TableView, ViewAction};
use rusqlite::Connection;
use serde_json::{json, Value};

fn load_view(conn: &Connection, id: &str, view_id: &str) -> Result<(String, TableView), Value> {
    let (dataset, raw) = match db::view_get(conn, view_id) {
        Ok(Some(found)) => found,
        Ok(None) => {
            return Err(err(
                id,
                "not_found",
                format!("view not found: {}", view_id),
                Some(json!({ "viewId": view_id })),
            ))
        }
        Err(e) => return Err(err(id, "db_query_failed", format!("{e:#}"), None)),
    };
    let view = serde_json::from_value::<TableView>(raw)
        .map_err(|e| err(id, "db_query_failed", format!("corrupt view state: {}", e), None))?;
    Ok((dataset, view))
}

fn save_view(conn: &Connection, id: &str, view_id: &str, view: &TableView) -> Result<(), Value> {
    match db::view_update(conn, view_id, &json!(view)) {
        Ok(true) => Ok(()),
        Ok(false) => Err(err(
            id,
            "not_found",
            format!("view not found: {}", view_id),
            Some(json!({ "viewId": view_id })),
        )),
        Err(e) => Err(err(id, "db_insert_failed", format!("{e:#}"), None)),
    }
}

/// Rows and layout behind a view.
fn load_table(conn: &Connection, id: &str, dataset: &str) -> Result<(Vec<Value>, TableLayout), Value> {
    let (_, records) = load_records(conn, id, dataset)?;
    let layout = load_layout(conn, dataset)
        .map_err(|e| err(id, "db_query_failed", format!("{e:#}"), None))?
        .unwrap_or_default();
    Ok((records, layout))
}

fn matching_pages(records: &[Value], layout: &TableLayout, view: &TableView, plugins: &PluginRegistry) -> usize {
    let selected = table::select(records, &view.to_config(layout), plugins);
    paginate::total_pages(selected.len(), view.page_size)
}

fn view_json(view_id: &str, dataset: &str, view: &TableView) -> Value {
    json!({
        "viewId": view_id,
        "dataset": dataset,
        "state": view
    })
}

fn handle_views_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let dataset = match required_str(req, "dataset") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    match db::dataset_revision(conn, dataset) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return err(
                &req.id,
                "not_found",
                format!("dataset not found: {}", dataset),
                Some(json!({ "dataset": dataset })),
            )
        }
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
    let settings = match load_table_settings(Some(conn)) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };

    let mut view = TableView::new(settings.default_page_size);
    match req.params.get("pageSize") {
        None | Some(Value::Null) => {}
        Some(v) => {
            let Some(n) = v.as_u64() else {
                return err(&req.id, "bad_params", "pageSize must be an integer", None);
            };
            if let Err(e) = view.set_page_size(n as usize, settings.max_page_size) {
                return table_err(&req.id, e);
            }
        }
    }

    let view_id = uuid::Uuid::new_v4().to_string();
    if let Err(e) = db::view_insert(conn, &view_id, dataset, &json!(view)) {
        return err(&req.id, "db_insert_failed", format!("{e:#}"), None);
    }
    tracing::info!(view_id = %view_id, dataset = %dataset, "view created");
    ok(&req.id, view_json(&view_id, dataset, &view))
}

fn handle_views_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let view_id = match required_str(req, "viewId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match load_view(conn, &req.id, view_id) {
        Ok((dataset, view)) => ok(&req.id, view_json(view_id, &dataset, &view)),
        Err(resp) => resp,
    }
}

fn handle_views_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let view_id = match required_str(req, "viewId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let action = match parse_action(req.params.get("action")) {
        Ok(v) => v,
        Err(e) => return table_err(&req.id, e),
    };
    let (dataset, mut view) = match load_view(conn, &req.id, view_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let settings = match load_table_settings(Some(conn)) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };

    // Only page jumps need the current match count.
    let total_pages = if matches!(action, ViewAction::SetPage { .. }) {
        let (records, layout) = match load_table(conn, &req.id, &dataset) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        matching_pages(&records, &layout, &view, &state.plugins)
    } else {
        0
    };

    if let Err(e) = view.apply(&action, total_pages, settings.max_page_size) {
        return table_err(&req.id, e);
    }
    if let Err(resp) = save_view(conn, &req.id, view_id, &view) {
        return resp;
    }
    ok(&req.id, view_json(view_id, &dataset, &view))
}

fn handle_views_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let view_id = match required_str(req, "viewId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (dataset, mut view) = match load_view(conn, &req.id, view_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (records, layout) = match load_table(conn, &req.id, &dataset) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let config = view.to_config(&layout);
    let selected = table::select(&records, &config, &state.plugins);
    let total_pages = paginate::total_pages(selected.len(), view.page_size);
    if view.clamp_page(total_pages) {
        tracing::debug!(view_id = %view_id, page = view.current_page, "clamped stale view page");
        if let Err(resp) = save_view(conn, &req.id, view_id, &view) {
            return resp;
        }
    }

    let (page, meta) = paginate::paginate(&selected, view.page_size, view.current_page);
    let out = PageOutput {
        page: page.into_iter().cloned().collect(),
        meta,
    };
    let mut result = view_json(view_id, &dataset, &view);
    if let (Some(obj), Value::Object(page_obj)) = (result.as_object_mut(), json!(out)) {
        obj.extend(page_obj);
    }
    ok(&req.id, result)
}

fn handle_views_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let view_id = match required_str(req, "viewId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match db::view_delete(conn, view_id) {
        Ok(true) => ok(&req.id, json!({ "deleted": true })),
        Ok(false) => err(
            &req.id,
            "not_found",
            format!("view not found: {}", view_id),
            Some(json!({ "viewId": view_id })),
        ),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "views.create" => Some(handle_views_create(state, req)),
        "views.get" => Some(handle_views_get(state, req)),
        "views.update" => Some(handle_views_update(state, req)),
        "views.open" => Some(handle_views_open(state, req)),
        "views.delete" => Some(handle_views_delete(state, req)),
        _ => None,
    }
}
