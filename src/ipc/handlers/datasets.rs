use crate::cache::QueryKey;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

/// Stored records of `name` with their revision, or a ready error response.
pub(crate) fn load_records(
    conn: &rusqlite::Connection,
    id: &str,
    name: &str,
) -> Result<(i64, Vec<Value>), Value> {
    match db::dataset_load(conn, name) {
        Ok(Some(found)) => Ok(found),
        Ok(None) => Err(err(
            id,
            "not_found",
            format!("dataset not found: {}", name),
            Some(json!({ "dataset": name })),
        )),
        Err(e) => Err(err(id, "db_query_failed", format!("{e:#}"), None)),
    }
}

fn handle_datasets_put(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    let Some(records) = req.params.get("records").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "records must be an array", None);
    };

    let revision = match db::dataset_put(conn, &name, records) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_insert_failed", format!("{e:#}"), None),
    };
    state.cache.invalidate(&name);
    tracing::info!(dataset = %name, revision, records = records.len(), "dataset stored");
    ok(
        &req.id,
        json!({
            "name": name,
            "revision": revision,
            "recordCount": records.len()
        }),
    )
}

fn handle_datasets_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match db::dataset_list(conn) {
        Ok(datasets) => ok(&req.id, json!({ "datasets": datasets })),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

fn handle_datasets_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    let key = QueryKey::detail(name, name);
    if let Some(hit) = state.cache.get(&key) {
        return ok(&req.id, hit);
    }
    match load_records(conn, &req.id, name) {
        Ok((revision, records)) => {
            let result = json!({
                "name": name,
                "revision": revision,
                "records": records
            });
            state.cache.put(key, result.clone());
            ok(&req.id, result)
        }
        Err(resp) => resp,
    }
}

fn handle_datasets_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    match db::dataset_delete(conn, &name) {
        Ok(true) => {
            state.cache.invalidate(&name);
            tracing::info!(dataset = %name, "dataset deleted");
            ok(&req.id, json!({ "deleted": true }))
        }
        Ok(false) => err(
            &req.id,
            "not_found",
            format!("dataset not found: {}", name),
            Some(json!({ "dataset": name })),
        ),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "datasets.put" => Some(handle_datasets_put(state, req)),
        "datasets.list" => Some(handle_datasets_list(state, req)),
        "datasets.get" => Some(handle_datasets_get(state, req)),
        "datasets.delete" => Some(handle_datasets_delete(state, req)),
        _ => None,
    }
}
