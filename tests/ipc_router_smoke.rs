mod test_support;

use serde_json::json;
use test_support::{spawn_sidecar, student_layout, students, temp_dir};

fn assert_routed(value: &serde_json::Value, method: &str) {
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("datatabled-router-smoke");
    let mut sidecar = spawn_sidecar();
    let layout = student_layout();

    let calls = vec![
        ("health", json!({})),
        ("workspace.select", json!({ "path": workspace.to_string_lossy() })),
        ("settings.get", json!({})),
        ("settings.update", json!({ "patch": { "defaultPageSize": 10 } })),
        ("datasets.put", json!({ "name": "smoke", "records": students() })),
        ("datasets.list", json!({})),
        ("datasets.get", json!({ "name": "smoke" })),
        (
            "layouts.set",
            json!({ "dataset": "smoke", "columns": layout["columns"], "filters": layout["filters"] }),
        ),
        ("layouts.get", json!({ "dataset": "smoke" })),
        ("table.process", json!({ "dataset": "smoke" })),
        ("table.search", json!({ "dataset": "smoke", "searchState": "alumno" })),
        ("table.filter", json!({ "dataset": "smoke", "filterState": { "estado": "true" } })),
        ("table.sort", json!({ "dataset": "smoke", "sortState": { "key": "nombre" } })),
        ("table.paginate", json!({ "dataset": "smoke", "pageSize": 5 })),
        ("plugins.list", json!({})),
        ("views.create", json!({ "dataset": "smoke" })),
    ];
    let mut view_id = String::new();
    for (method, params) in calls {
        let value = sidecar.request(method, params);
        assert_routed(&value, method);
        assert_eq!(value["ok"], json!(true), "{} failed: {}", method, value);
        if method == "views.create" {
            view_id = value["result"]["viewId"].as_str().expect("viewId").to_string();
        }
    }

    for (method, params) in [
        ("views.get", json!({ "viewId": view_id })),
        ("views.update", json!({ "viewId": view_id, "action": { "type": "clearFilters" } })),
        ("views.open", json!({ "viewId": view_id })),
        ("views.delete", json!({ "viewId": view_id })),
        ("datasets.delete", json!({ "name": "smoke" })),
    ] {
        let value = sidecar.request(method, params);
        assert_routed(&value, method);
        assert_eq!(value["ok"], json!(true), "{} failed: {}", method, value);
    }

    assert_eq!(sidecar.request_err("nope.method", json!({})), "not_implemented");
    sidecar.shutdown();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_lines_get_bad_json_and_the_loop_keeps_going() {
    let mut sidecar = spawn_sidecar();
    let bad = sidecar.send_line("{not json");
    assert_eq!(bad["ok"], json!(false));
    assert_eq!(bad["error"]["code"], json!("bad_json"));
    assert!(bad.get("id").is_none());

    let health = sidecar.request_ok("health", json!({}));
    assert_eq!(health["version"], json!(env!("CARGO_PKG_VERSION")));
    assert_eq!(health["workspacePath"], json!(null));
    sidecar.shutdown();
}

#[test]
fn workspace_scoped_methods_need_a_workspace() {
    let mut sidecar = spawn_sidecar();
    for method in ["settings.get", "datasets.list", "layouts.get", "views.get"] {
        let code = sidecar.request_err(method, json!({ "dataset": "x", "viewId": "y" }));
        assert_eq!(code, "no_workspace", "{}", method);
    }
    assert_eq!(
        sidecar.request_err("workspace.select", json!({})),
        "bad_params"
    );
    sidecar.shutdown();
}

#[test]
fn settings_roundtrip_and_validation() {
    let workspace = temp_dir("datatabled-settings");
    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace(&workspace);

    let defaults = sidecar.request_ok("settings.get", json!({}));
    assert_eq!(defaults["table"], json!({ "defaultPageSize": 10, "maxPageSize": 500 }));

    sidecar.request_ok("settings.update", json!({ "patch": { "defaultPageSize": 3 } }));
    let out = sidecar.request_ok("table.process", json!({ "records": students() }));
    assert_eq!(out["totalPages"], json!(8));

    for patch in [
        json!({ "defaultPageSize": 0 }),
        json!({ "maxPageSize": 5001 }),
        json!({ "defaultPageSize": "ten" }),
        json!({ "colour": "red" }),
    ] {
        assert_eq!(
            sidecar.request_err("settings.update", json!({ "patch": patch })),
            "bad_params"
        );
    }
    let after = sidecar.request_ok("settings.get", json!({}));
    assert_eq!(after["table"]["defaultPageSize"], json!(3));

    sidecar.shutdown();
    let _ = std::fs::remove_dir_all(workspace);
}
