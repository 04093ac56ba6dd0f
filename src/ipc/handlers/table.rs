use crate::cache::QueryKey;
use crate::db;
use crate::ipc::error::{err, ok, table_err};
use crate::ipc::handlers::datasets::load_records;
use crate::ipc::handlers::layouts::load_layout;
use crate::ipc::handlers::settings::load_table_settings;
use crate::ipc::types::{AppState, Request};
use crate::table::config::parse_config;
use crate::table::{self, filter, paginate, search, sort, PageOutput, TableConfig};
use serde_json::{json, Value};

/// Where the rows of a table request come from.
enum Source {
    Inline(Vec<Value>),
    Dataset(String),
}

fn parse_source(req: &Request) -> Result<Source, Value> {
    if let Some(dataset) = req.params.get("dataset").and_then(|v| v.as_str()) {
        if dataset.trim().is_empty() {
            return Err(err(&req.id, "bad_params", "dataset must not be empty", None));
        }
        return Ok(Source::Dataset(dataset.trim().to_string()));
    }
    match req.params.get("records") {
        Some(Value::Array(records)) => Ok(Source::Inline(records.clone())),
        Some(_) => Err(err(&req.id, "bad_params", "records must be an array", None)),
        None => Err(err(
            &req.id,
            "bad_params",
            "missing params.records or params.dataset",
            None,
        )),
    }
}

fn parse_request_config(state: &AppState, req: &Request, raw: Option<&Value>) -> Result<TableConfig, Value> {
    let settings = load_table_settings(state.db.as_ref())
        .map_err(|e| err(&req.id, "db_query_failed", format!("{e:#}"), None))?;
    let mut raw = match raw {
        None | Some(Value::Null) => json!({}),
        Some(v) => v.clone(),
    };
    if let Some(obj) = raw.as_object_mut() {
        if !obj.contains_key("pageSize") {
            obj.insert("pageSize".into(), json!(settings.default_page_size));
        }
    }
    parse_config(Some(&raw), settings.max_page_size).map_err(|e| table_err(&req.id, e))
}

/// Stage methods take the config fields beside `records`, e.g.
/// `{ records, columns, searchState }`.
fn stage_config(state: &AppState, req: &Request) -> Result<TableConfig, Value> {
    let mut raw = req.params.clone();
    if let Some(obj) = raw.as_object_mut() {
        obj.remove("records");
        obj.remove("dataset");
    }
    parse_request_config(state, req, Some(&raw))
}

/// Rows plus the config completed from the stored layout when the request
/// names a dataset.
fn load_input(state: &AppState, req: &Request, source: Source, config: TableConfig) -> Result<(Vec<Value>, TableConfig), Value> {
    match source {
        Source::Inline(records) => Ok((records, config)),
        Source::Dataset(name) => {
            let Some(conn) = state.db.as_ref() else {
                return Err(err(&req.id, "no_workspace", "select a workspace first", None));
            };
            let (_, records) = load_records(conn, &req.id, &name)?;
            let layout = load_layout(conn, &name)
                .map_err(|e| err(&req.id, "db_query_failed", format!("{e:#}"), None))?
                .unwrap_or_default();
            Ok((records, config.with_layout_defaults(&layout)))
        }
    }
}

fn handle_table_process(state: &mut AppState, req: &Request) -> serde_json::Value {
    let source = match parse_source(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let config = match parse_request_config(state, req, req.params.get("config")) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let name = match source {
        Source::Dataset(name) => name,
        Source::Inline(records) => {
            let out = table::process(&records, &config, &state.plugins);
            return ok(&req.id, json!(out));
        }
    };

    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let revision = match db::dataset_revision(conn, &name) {
        Ok(Some(v)) => v,
        Ok(None) => {
            return err(
                &req.id,
                "not_found",
                format!("dataset not found: {}", name),
                Some(json!({ "dataset": name })),
            )
        }
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    let key = QueryKey::list(&name, &json!({ "revision": revision, "config": config }));
    if let Some(hit) = state.cache.get(&key) {
        tracing::debug!(dataset = %name, "table.process served from cache");
        return ok(&req.id, hit);
    }

    let (records, config) = match load_input(state, req, Source::Dataset(name.clone()), config) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let out = json!(table::process(&records, &config, &state.plugins));
    state.cache.put(key, out.clone());
    tracing::debug!(dataset = %name, records = records.len(), "table.process computed");
    ok(&req.id, out)
}

fn handle_stage(state: &mut AppState, req: &Request, stage: &str) -> serde_json::Value {
    let source = match parse_source(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let config = match stage_config(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (records, config) = match load_input(state, req, source, config) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let all: Vec<&Value> = records.iter().collect();

    let selected = match stage {
        "search" => search::search(&all, &config.columns, &config.search_state),
        "filter" => filter::filter(&all, &config.filters, &config.filter_state, &state.plugins),
        "sort" => sort::sort(&all, &config.sort_state, &config.columns),
        _ => {
            let (page, meta) = paginate::paginate(&all, config.page_size, config.current_page);
            let out = PageOutput {
                page: page.into_iter().cloned().collect(),
                meta,
            };
            return ok(&req.id, json!(out));
        }
    };
    ok(
        &req.id,
        json!({
            "records": selected,
            "count": selected.len()
        }),
    )
}

fn handle_plugins_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "plugins": state.plugins.names() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "table.process" => Some(handle_table_process(state, req)),
        "table.search" => Some(handle_stage(state, req, "search")),
        "table.filter" => Some(handle_stage(state, req, "filter")),
        "table.sort" => Some(handle_stage(state, req, "sort")),
        "table.paginate" => Some(handle_stage(state, req, "paginate")),
        "plugins.list" => Some(handle_plugins_list(state, req)),
        _ => None,
    }
}
