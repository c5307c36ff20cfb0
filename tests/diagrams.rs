use gnd::engine::{Engine, render_json};
use gnd::model::Outcome;
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

struct TempStore {
    _dir: TempDir,
    db_path: PathBuf,
}

impl TempStore {
    fn new(fixture: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("job.sqlite");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(&fixture_sql(fixture)).unwrap();
        drop(conn);
        Self { _dir: dir, db_path }
    }

    fn render(&self, request: Request) -> Value {
        let raw = render_json(&self.db_path, request, None).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

fn accessions(response: &Value) -> Vec<String> {
    response["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|elem| elem["attributes"]["accession"].as_str().unwrap().to_string())
        .collect()
}

fn close(actual: &Value, expected: f64) -> bool {
    (actual.as_f64().unwrap() - expected).abs() < 1e-9
}

#[test]
fn direct_job_envelope() {
    let store = TempStore::new("direct.sql");
    let response = store.render(Request::diagrams("0-2", 7.5, 2));

    assert_eq!(response["error"], json!(false));
    assert_eq!(response["eod"], json!(false));
    assert_eq!(response["message"], json!(""));
    assert!(response.get("stats").is_none());
    assert_eq!(response["time"], json!("#Q=3 TQ=0 #N=3 TN=0 PROC=0 PARSE=0 Total=0"));
    assert_eq!(response["counts"], json!({"max": 3, "invalid": [], "displayed": 0}));
    assert_eq!(accessions(&response), vec!["P00001", "P00002", "P00003"]);

    assert!(close(&response["legend_scale"], 40000.0));
    assert!(close(&response["min_bp"], -20000.0));
    assert!(close(&response["max_bp"], 20000.0));
    assert!(close(&response["scale_factor"], 7.5));
    assert!(close(&response["min_pct"], 0.4));
    assert!(close(&response["max_pct"], 0.5625));
}

#[test]
fn direct_job_attributes() {
    let store = TempStore::new("direct.sql");
    let response = store.render(Request::diagrams("0-2", 7.5, 2));
    let first = &response["data"][0]["attributes"];

    assert_eq!(first["organism"], json!("Escherichia coli"));
    assert_eq!(first["color"], json!(["#aa0000", "#00aa00"]));
    assert_eq!(first["family"], json!(["PF01", "PF02"]));
    assert_eq!(first["pfam_desc"], json!(["d1", "d2"]));
    assert_eq!(first["type"], json!("bacterial"));
    assert_eq!(first["pid"], json!(-1));
    assert_eq!(first["rel_start"], json!(0.5));
    assert!(close(&first["rel_width"], 0.0125));
    assert!(close(&first["evalue"], 1e-5));
    // cluster_num only surfaces for cluster jobs
    assert!(first.get("cluster_num").is_none());

    let second = &response["data"][1]["attributes"];
    assert_eq!(second["organism"], json!(""));
    assert_eq!(second["color"], json!([""]));
    assert_eq!(second["family"], json!(["none-query"]));
    assert_eq!(second["family_desc"], json!(["Query without family"]));
    assert_eq!(second["interpro"], json!(["none"]));
    assert!(second.get("evalue").is_none());
}

#[test]
fn neighbors_follow_window_and_focal_offset() {
    let store = TempStore::new("direct.sql");
    let response = store.render(Request::diagrams("0-2", 7.5, 2));

    let neighbors = response["data"][0]["neighbors"].as_array().unwrap();
    let nums: Vec<i64> = neighbors.iter().map(|n| n["num"].as_i64().unwrap()).collect();
    assert_eq!(nums, vec![3, 4, 6, 7]);
    assert!(close(&neighbors[0]["rel_start"], 0.4));
    assert!(close(&neighbors[0]["rel_width"], 0.02));
    assert_eq!(neighbors[1]["family"], json!(["none-query"]));

    let nums: Vec<i64> = response["data"][1]["neighbors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["num"].as_i64().unwrap())
        .collect();
    assert_eq!(nums, vec![11, 13]);

    let wide = store.render(Request::diagrams("0-0", 7.5, 10));
    assert_eq!(wide["data"][0]["neighbors"].as_array().unwrap().len(), 6);
}

#[test]
fn uniref90_range_is_translated_sorted_and_filtered() {
    let store = TempStore::new("gnn_uniref90.sql");
    let request = Request::diagrams("0-3", 7.5, 1).with_id_type(IdType::UniRef90);
    let response = store.render(request);

    assert_eq!(response["error"], json!(false));
    // Q1 is a singleton child; the rest are ordered by UniRef90 size
    assert_eq!(accessions(&response), vec!["Q2", "Q0", "Q3"]);
    assert_eq!(response["counts"]["max"], json!(4));

    let first = &response["data"][0];
    assert_eq!(first["attributes"]["cluster_num"], json!(2));
    assert_eq!(first["attributes"]["uniref90_size"], json!(7));
    assert_eq!(first["neighbors"][0]["accession"], json!("M2"));
}

#[test]
fn expanded_uniref90_cluster_keeps_members_in_order() {
    let store = TempStore::new("gnn_uniref90.sql");
    let request = Request::diagrams("3-5", 7.5, 1)
        .with_id_type(IdType::UniRef90)
        .with_uniref_id("UniRef90_Q3");
    let response = store.render(request);

    assert_eq!(response["error"], json!(false));
    assert_eq!(accessions(&response), vec!["Q3", "Q1", "Q2"]);
}

#[test]
fn cluster_children_depend_on_nesting_level() {
    let store = TempStore::new("uniref50_sizes.sql");

    let clusters = store.render(Request::diagrams("0-2", 7.5, 5));
    assert_eq!(accessions(&clusters), vec!["R2", "R0"]);

    let proteins = store.render(Request::diagrams("0-2", 7.5, 5).with_id_type(IdType::UniProt));
    assert_eq!(accessions(&proteins), vec!["R0", "R1", "R2"]);
    assert_eq!(proteins["data"][1]["attributes"]["uniref50_size"], json!(0));
}

#[test]
fn reversed_range_yields_no_diagrams() {
    let store = TempStore::new("direct.sql");
    let response = store.render(Request::diagrams("2-1", 7.5, 2));
    assert_eq!(response["error"], json!(false));
    assert_eq!(response["data"], json!([]));
    assert_eq!(response["min_pct"], json!(2.0));
    assert_eq!(response["max_pct"], json!(-2.0));
}

#[test]
fn missing_focal_row_is_an_error_envelope() {
    let store = TempStore::new("direct.sql");
    let response = store.render(Request::diagrams("1-10", 7.5, 2));

    assert_eq!(response["error"], json!(true));
    assert_eq!(response["eod"], json!(true));
    assert!(
        response["message"]
            .as_str()
            .unwrap()
            .contains("no row returned by attributes for index 3")
    );
    assert!(response.get("data").is_none());
}

#[test]
fn malformed_range_is_an_error_envelope() {
    let store = TempStore::new("direct.sql");
    let response = store.render(Request::diagrams("abc", 7.5, 2));
    assert_eq!(response["error"], json!(true));
    assert!(response["message"].as_str().unwrap().contains("abc"));
}

#[test]
fn missing_translation_table_is_an_error_envelope() {
    let store = TempStore::new("gnn_uniref90.sql");
    let request = Request::diagrams("0-3", 7.5, 1).with_id_type(IdType::UniRef50);
    let response = store.render(request);
    assert_eq!(response["error"], json!(true));
    assert!(response["message"].as_str().unwrap().contains("uniref50_range"));
}

#[test]
fn engine_outcome_matches_requested_span() {
    let store = TempStore::new("direct.sql");
    let mut engine = Engine::open(&store.db_path, Request::diagrams("0-1", 30.0, 2), None).unwrap();
    let Outcome::Diagrams(payload) = engine.run().unwrap() else {
        panic!("expected diagrams");
    };
    assert_eq!(payload.counts.max, 2);
    assert_eq!(payload.data.len(), 2);
    assert_eq!(payload.bounds.legend_scale, 10000.0);
    assert_eq!(payload.bounds.scale_factor, 30.0);
}

#[test]
fn expanded_uniref50_cluster_is_translated_and_sorted_by_uniref90_size() {
    let store = TempStore::new("gnn_uniref50.sql");
    let request = Request::diagrams("10-13", 7.5, 1)
        .with_id_type(IdType::UniRef50)
        .with_uniref_id("UniRef50_S1");
    let response = store.render(request);

    assert_eq!(response["error"], json!(false));
    // members 10..13 map to clusters 0, 2, 3, 1; S2 is a child
    assert_eq!(accessions(&response), vec!["S1", "S3", "S0"]);
    assert_eq!(response["counts"]["max"], json!(4));
}

#[test]
fn uniref50_range_goes_through_range_table() {
    let store = TempStore::new("gnn_uniref50.sql");
    let response = store.render(Request::diagrams("0-0", 7.5, 1).with_id_type(IdType::UniRef50));
    assert_eq!(accessions(&response), vec!["S1"]);
    assert_eq!(response["data"][0]["attributes"]["cluster_num"], json!(4));
}

#[test]
fn null_size_is_not_a_cluster_child() {
    let store = TempStore::new("null_sizes.sql");
    let request = Request::diagrams("0-2", 7.5, 1).with_id_type(IdType::parse("x"));
    let response = store.render(request);

    assert_eq!(response["error"], json!(false));
    assert_eq!(accessions(&response), vec!["T2", "T0"]);
    let kept = &response["data"][1]["attributes"];
    assert_eq!(kept["uniref90_size"], json!(0));
    assert!(kept.as_object().unwrap().contains_key("uniref50_size"));
    assert_eq!(kept["uniref50_size"], json!(null));
}

#[test]
fn stored_values_are_passed_through() {
    let store = TempStore::new("null_sizes.sql");
    let request = Request::diagrams("0-0", 7.5, 1).with_id_type(IdType::UniProt);
    let response = store.render(request);

    let attributes = &response["data"][0]["attributes"];
    assert_eq!(attributes["start"], json!(10.5));
    assert_eq!(attributes["stop"], json!(400));
    assert_eq!(attributes["seq_len"], json!("unknown"));
    assert_eq!(attributes["taxon_id"], json!(1));
}

#[test]
fn overflowing_window_is_an_error_envelope() {
    let store = TempStore::new("direct.sql");
    let response = store.render(Request::diagrams("0-0", 7.5, i64::MAX));

    assert_eq!(response["error"], json!(true));
    assert_eq!(response["eod"], json!(true));
    assert!(response["message"].as_str().unwrap().contains("`window`"));
    assert!(response.get("data").is_none());
}

#[test]
fn overflowing_range_is_an_error_envelope() {
    let store = TempStore::new("direct.sql");
    let response = store.render(Request::diagrams("0-9223372036854775807", 7.5, 2));

    assert_eq!(response["error"], json!(true));
    assert!(response["message"].as_str().unwrap().contains("`range`"));
    assert!(response.get("counts").is_none());
}

#[test]
fn unusable_scale_factor_is_an_error_envelope() {
    let store = TempStore::new("direct.sql");
    for scale_factor in [0.0, f64::NAN, f64::INFINITY] {
        let response = store.render(Request::diagrams("0-0", scale_factor, 2));
        assert_eq!(response["error"], json!(true));
        assert!(response["message"].as_str().unwrap().contains("`scale-factor`"));
        assert!(response.get("legend_scale").is_none());
    }
}
