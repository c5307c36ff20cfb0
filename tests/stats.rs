use gnd::engine::render_json;
use gnd::request::{IdType, Request};
use rusqlite::Connection;
use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_sql(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn setup_store(fixture: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("job.sqlite");
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(&fixture_sql(fixture)).unwrap();
    (dir, db_path)
}

fn stats_of(fixture: &str, request: Request) -> Value {
    let (_dir, db_path) = setup_store(fixture);
    let raw = render_json(&db_path, request, None).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn direct_job_stats() {
    let response = stats_of("direct.sql", Request::stats("1", 10));

    assert_eq!(response["error"], json!(false));
    assert_eq!(response["eod"], json!(false));
    assert!(response.get("data").is_none());

    let stats = &response["stats"];
    assert_eq!(stats["max_index"], json!(2));
    assert_eq!(stats["num_checked"], json!(3));
    assert_eq!(stats["index_range"], json!([[0, 2]]));
    assert_eq!(stats["scale_factor"], json!(7.5));
    assert_eq!(stats["min_bp"].as_f64(), Some(-6000.0));
    assert_eq!(stats["max_bp"].as_f64(), Some(5200.0));
    assert_eq!(stats["legend_scale"].as_f64(), Some(11200.0));
    assert_eq!(stats["query_width"].as_f64(), Some(900.0));
    assert_eq!(stats["actual_max_width"].as_f64(), Some(12900.0));
    assert_eq!(stats["has_uniref"], json!(false));
    assert_eq!(
        stats["time_data"],
        json!("#Ids: 3, #Queries: 6, QueryTime: 0, #Fetch: 12, FetchTime: 0, Total: 0 PROC=0 PARSE=0")
    );
}

#[test]
fn probed_uniref90_job_stats() {
    let response = stats_of("gnn_uniref90.sql", Request::stats("2", 10));
    let stats = &response["stats"];

    assert_eq!(stats["max_index"], json!(3));
    assert_eq!(stats["num_checked"], json!(4));
    assert_eq!(stats["index_range"], json!([[0, 3]]));
    assert_eq!(stats["query_width"].as_f64(), Some(1200.0));
    assert_eq!(stats["actual_max_width"].as_f64(), Some(3200.0));
    assert_eq!(stats["has_uniref"], json!(90));
}

#[test]
fn uniref_expansion_uses_range_table() {
    let request = Request::stats("2", 10)
        .with_id_type(IdType::UniRef90)
        .with_uniref_id("UniRef90_Q3");
    let response = stats_of("gnn_uniref90.sql", request);
    let stats = &response["stats"];

    assert_eq!(stats["index_range"], json!([[3, 5]]));
    assert_eq!(stats["max_index"], json!(2));
    assert_eq!(stats["num_checked"], json!(3));
}

#[test]
fn unknown_cluster_is_an_error_envelope() {
    let response = stats_of("direct.sql", Request::stats("99", 10));

    assert_eq!(response["error"], json!(true));
    assert_eq!(response["eod"], json!(true));
    assert!(response.get("stats").is_none());
    assert!(
        response["message"]
            .as_str()
            .unwrap()
            .contains("no row returned by cluster_index for cluster 99")
    );
}

#[test]
fn missing_store_is_an_error_envelope() {
    let dir = TempDir::new().unwrap();
    let raw = render_json(&dir.path().join("absent.sqlite"), Request::stats("1", 10), None).unwrap();
    let response: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(response["error"], json!(true));
    assert!(response["message"].as_str().unwrap().contains("absent.sqlite"));
}
