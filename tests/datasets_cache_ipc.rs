mod test_support;

use serde_json::json;
use test_support::{ids, spawn_sidecar, spawn_sidecar_with_env, student_layout, students, temp_dir};

fn cache_stats(sidecar: &mut test_support::Sidecar) -> (i64, i64) {
    let health = sidecar.request_ok("health", json!({}));
    (
        health["cache"]["hits"].as_i64().expect("hits"),
        health["cache"]["misses"].as_i64().expect("misses"),
    )
}

#[test]
fn dataset_lifecycle_bumps_revisions() {
    let workspace = temp_dir("datatabled-datasets");
    let mut sidecar = spawn_sidecar();
    assert_eq!(
        sidecar.request_err("datasets.list", json!({})),
        "no_workspace"
    );
    sidecar.select_workspace(&workspace);

    let put = sidecar.request_ok(
        "datasets.put",
        json!({ "name": "alumnos", "records": students() }),
    );
    assert_eq!(put["revision"], json!(1));
    assert_eq!(put["recordCount"], json!(23));

    let put = sidecar.request_ok(
        "datasets.put",
        json!({ "name": "alumnos", "records": students()[..3] }),
    );
    assert_eq!(put["revision"], json!(2));

    let list = sidecar.request_ok("datasets.list", json!({}));
    assert_eq!(list["datasets"][0]["name"], json!("alumnos"));
    assert_eq!(list["datasets"][0]["recordCount"], json!(3));

    let got = sidecar.request_ok("datasets.get", json!({ "name": "alumnos" }));
    assert_eq!(ids(&got["records"]), vec![1, 2, 3]);

    assert_eq!(
        sidecar.request_err("datasets.put", json!({ "name": "x", "records": "nope" })),
        "bad_params"
    );
    assert_eq!(
        sidecar.request_err("datasets.get", json!({ "name": "missing" })),
        "not_found"
    );

    sidecar.request_ok("datasets.delete", json!({ "name": "alumnos" }));
    assert_eq!(
        sidecar.request_err("datasets.delete", json!({ "name": "alumnos" })),
        "not_found"
    );
    sidecar.shutdown();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn stored_layout_fills_columns_and_filters() {
    let workspace = temp_dir("datatabled-layouts");
    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace(&workspace);
    sidecar.request_ok(
        "datasets.put",
        json!({ "name": "alumnos", "records": students() }),
    );
    assert_eq!(
        sidecar.request_err("layouts.get", json!({ "dataset": "alumnos" })),
        "not_found"
    );

    let layout = student_layout();
    sidecar.request_ok(
        "layouts.set",
        json!({
            "dataset": "alumnos",
            "columns": layout["columns"],
            "filters": layout["filters"]
        }),
    );
    let stored = sidecar.request_ok("layouts.get", json!({ "dataset": "alumnos" }));
    assert_eq!(stored["columns"][1]["key"], json!("pension"));
    assert_eq!(stored["filters"]["estado"]["kind"], json!("boolean"));

    let out = sidecar.request_ok(
        "table.process",
        json!({
            "dataset": "alumnos",
            "config": {
                "filterState": { "estado": "false" },
                "sortState": { "key": "pension", "direction": "desc" }
            }
        }),
    );
    assert_eq!(ids(&out["page"]), vec![20, 16, 12, 8, 4]);

    assert_eq!(
        sidecar.request_err(
            "layouts.set",
            json!({ "dataset": "alumnos", "columns": [{ "key": "x", "type": "emoji" }] })
        ),
        "bad_params"
    );
    sidecar.shutdown();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn repeated_queries_hit_the_cache_until_the_dataset_changes() {
    let workspace = temp_dir("datatabled-cache");
    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace(&workspace);
    sidecar.request_ok(
        "datasets.put",
        json!({ "name": "alumnos", "records": students() }),
    );
    let layout = student_layout();
    sidecar.request_ok(
        "layouts.set",
        json!({ "dataset": "alumnos", "columns": layout["columns"], "filters": layout["filters"] }),
    );

    let params = json!({ "dataset": "alumnos", "config": { "currentPage": 3 } });
    let first = sidecar.request_ok("table.process", params.clone());
    let (hits_before, _) = cache_stats(&mut sidecar);
    let second = sidecar.request_ok("table.process", params.clone());
    let (hits_after, _) = cache_stats(&mut sidecar);
    assert_eq!(first, second);
    assert_eq!(hits_after, hits_before + 1);

    sidecar.request_ok(
        "datasets.put",
        json!({ "name": "alumnos", "records": students()[..12] }),
    );
    let third = sidecar.request_ok("table.process", params);
    assert_eq!(third["totalPages"], json!(2));
    assert_eq!(third["page"], json!([]));
    let (hits_final, _) = cache_stats(&mut sidecar);
    assert_eq!(hits_final, hits_after);

    sidecar.shutdown();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn zero_capacity_from_env_disables_caching() {
    let workspace = temp_dir("datatabled-cache-off");
    let ws = workspace.to_string_lossy().to_string();
    let mut sidecar = spawn_sidecar_with_env(&[
        ("DATATABLED_WORKSPACE", ws.as_str()),
        ("DATATABLED_CACHE_CAPACITY", "0"),
    ]);
    let health = sidecar.request_ok("health", json!({}));
    assert_eq!(health["workspacePath"], json!(ws));

    sidecar.request_ok(
        "datasets.put",
        json!({ "name": "alumnos", "records": students() }),
    );
    let params = json!({ "dataset": "alumnos" });
    sidecar.request_ok("table.process", params.clone());
    sidecar.request_ok("table.process", params);
    let (hits, _) = cache_stats(&mut sidecar);
    assert_eq!(hits, 0);
    sidecar.shutdown();
    let _ = std::fs::remove_dir_all(workspace);
}
