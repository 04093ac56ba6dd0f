mod test_support;

use serde_json::json;
use test_support::{ids, spawn_sidecar, student_layout, students};

fn student_config(extra: serde_json::Value) -> serde_json::Value {
    let mut config = student_layout();
    let obj = config.as_object_mut().expect("object");
    for (k, v) in extra.as_object().expect("extra object") {
        obj.insert(k.clone(), v.clone());
    }
    config
}

#[test]
fn inline_process_filters_sorts_and_pages_without_a_workspace() {
    let mut sidecar = spawn_sidecar();
    let out = sidecar.request_ok(
        "table.process",
        json!({
            "records": students(),
            "config": student_config(json!({
                "filterState": { "estado": "true" },
                "sortState": { "key": "pension", "direction": "desc" },
                "pageSize": 5,
                "currentPage": 1
            }))
        }),
    );
    assert_eq!(ids(&out["page"]), vec![23, 22, 21, 19, 18]);
    assert_eq!(out["totalPages"], json!(4));
    assert_eq!(out["totalRecords"], json!(18));
    assert_eq!(out["pageNumbers"], json!([1, 2, 3, 4]));
    assert_eq!(out["startIndex"], json!(0));
    assert_eq!(out["endIndex"], json!(5));
    sidecar.shutdown();
}

#[test]
fn empty_constraints_only_paginate() {
    let mut sidecar = spawn_sidecar();
    let out = sidecar.request_ok(
        "table.process",
        json!({
            "records": students(),
            "config": student_config(json!({
                "searchState": "   ",
                "filterState": { "estado": "all", "ghost": "x" },
                "currentPage": 2
            }))
        }),
    );
    assert_eq!(ids(&out["page"]), (11..=20).collect::<Vec<i64>>());
    assert_eq!(out["totalRecords"], json!(23));
    sidecar.shutdown();
}

#[test]
fn search_is_case_insensitive_substring() {
    let mut sidecar = spawn_sidecar();
    let out = sidecar.request_ok(
        "table.process",
        json!({
            "records": students(),
            "config": student_config(json!({ "searchState": "ALUMNO 2" }))
        }),
    );
    assert_eq!(ids(&out["page"]), vec![20, 21, 22, 23]);
    sidecar.shutdown();
}

#[test]
fn out_of_range_page_is_empty_not_an_error() {
    let mut sidecar = spawn_sidecar();
    let out = sidecar.request_ok(
        "table.process",
        json!({
            "records": students(),
            "config": student_config(json!({ "currentPage": 9 }))
        }),
    );
    assert_eq!(out["page"], json!([]));
    assert_eq!(out["totalPages"], json!(3));
    assert_eq!(out["startIndex"], json!(23));
    assert_eq!(out["endIndex"], json!(23));
    sidecar.shutdown();
}

#[test]
fn nulls_sort_first_in_both_directions() {
    let records = json!([
        { "id": 1, "pension": 300 },
        { "id": 2, "pension": null },
        { "id": 3 },
        { "id": 4, "pension": 100 }
    ]);
    let columns = json!([{ "key": "pension", "type": "number" }]);
    let mut sidecar = spawn_sidecar();

    let asc = sidecar.request_ok(
        "table.sort",
        json!({
            "records": records,
            "columns": columns,
            "sortState": { "key": "pension", "direction": "asc" }
        }),
    );
    assert_eq!(ids(&asc["records"]), vec![2, 3, 4, 1]);

    let desc = sidecar.request_ok(
        "table.sort",
        json!({
            "records": records,
            "columns": columns,
            "sortState": { "key": "pension", "direction": "desc" }
        }),
    );
    assert_eq!(ids(&desc["records"]), vec![2, 3, 1, 4]);
    sidecar.shutdown();
}

#[test]
fn stage_methods_match_their_contracts() {
    let mut sidecar = spawn_sidecar();
    let layout = student_layout();

    let searched = sidecar.request_ok(
        "table.search",
        json!({
            "records": students(),
            "columns": layout["columns"],
            "searchState": "alumno 2"
        }),
    );
    assert_eq!(searched["count"], json!(4));

    let filtered = sidecar.request_ok(
        "table.filter",
        json!({
            "records": students(),
            "filters": layout["filters"],
            "filterState": { "estado": "false" }
        }),
    );
    assert_eq!(ids(&filtered["records"]), vec![4, 8, 12, 16, 20]);

    let paged = sidecar.request_ok(
        "table.paginate",
        json!({
            "records": students(),
            "pageSize": 10,
            "currentPage": 3
        }),
    );
    assert_eq!(ids(&paged["page"]), vec![21, 22, 23]);
    assert_eq!(paged["pageNumbers"], json!([1, 2, 3]));
    sidecar.shutdown();
}

#[test]
fn plugin_filters_resolve_by_name() {
    let records = json!([
        {
            "id": 1,
            "matriculas": [
                { "estaActivo": false, "idAula": { "idGrado": { "nombre": "1ro" }, "seccion": "A" } },
                { "estaActivo": true, "idAula": { "idGrado": { "nombre": "2do" }, "seccion": "B" } }
            ]
        },
        {
            "id": 2,
            "matriculas": [
                { "estaActivo": true, "idAula": { "idGrado": { "nombre": "1ro" }, "seccion": "A" } }
            ]
        },
        { "id": 3, "matriculas": [] }
    ]);
    let mut sidecar = spawn_sidecar();

    let plugins = sidecar.request_ok("plugins.list", json!({}));
    assert!(plugins["plugins"]
        .as_array()
        .expect("plugins")
        .contains(&json!("activeEntryLabel")));

    let out = sidecar.request_ok(
        "table.filter",
        json!({
            "records": records,
            "filters": { "aula": { "kind": "plugin", "name": "activeEntryLabel" } },
            "filterState": { "aula": "1ro A" }
        }),
    );
    assert_eq!(ids(&out["records"]), vec![2]);

    // Unknown plug-ins leave the collection untouched.
    let out = sidecar.request_ok(
        "table.filter",
        json!({
            "records": records,
            "filters": { "aula": { "kind": "plugin", "name": "doesNotExist" } },
            "filterState": { "aula": "1ro A" }
        }),
    );
    assert_eq!(ids(&out["records"]), vec![1, 2, 3]);
    sidecar.shutdown();
}

#[test]
fn invalid_requests_are_rejected_with_bad_params() {
    let mut sidecar = spawn_sidecar();
    assert_eq!(sidecar.request_err("table.process", json!({})), "bad_params");
    assert_eq!(
        sidecar.request_err("table.process", json!({ "records": {} })),
        "bad_params"
    );
    assert_eq!(
        sidecar.request_err(
            "table.process",
            json!({ "records": [], "config": { "pageSize": 0 } })
        ),
        "bad_params"
    );
    assert_eq!(
        sidecar.request_err(
            "table.process",
            json!({ "records": [], "config": { "pageSize": 501 } })
        ),
        "bad_params"
    );
    assert_eq!(
        sidecar.request_err(
            "table.process",
            json!({
                "records": [],
                "config": { "filters": { "x": { "kind": "nope", "path": "a" } } }
            })
        ),
        "bad_params"
    );
    assert_eq!(
        sidecar.request_err("table.process", json!({ "dataset": "alumnos" })),
        "no_workspace"
    );
    sidecar.shutdown();
}
