// tests/pipeline_tests.rs

use djc::output::table_to_json;
use djc::{ConfigError, Extractor, JobConfig, Mapper, Pipeline, Value};
use indexmap::IndexMap;
use serde_json::json;

fn school() -> IndexMap<String, Value> {
    let mut docs = IndexMap::new();
    docs.insert(
        "instructors".to_string(),
        Value::from(json!([
            {"id": 1, "name": "Lee"},
            {"id": 2, "name": "Kim"}
        ])),
    );
    docs.insert(
        "classes".to_string(),
        Value::from(json!([
            {"title": "Math", "instructor": 1, "scores": [90, 70]},
            {"title": "Art", "instructor": 2, "scores": [60]},
            {"title": "Music", "instructor": 1, "scores": []}
        ])),
    );
    docs
}

const JOB: &str = r#"{
    "merge": [
        {"left": "instructors", "right": "classes", "on": [["id", "instructor"]], "into": "classes"}
    ],
    "extract": {
        "nodes": [
            {"key": "instructors", "name": "lecturer", "children": [
                {"capture": "name"},
                {"key": "classes", "children": [
                    {"capture": "title"},
                    {"capture": "scores", "name": "mean", "compose": [{"fn": "avg"}]}
                ]}
            ]}
        ]
    }
}"#;

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_run_named_merges_then_projects() {
    let pipeline = JobConfig::from_json(JOB).unwrap().pipeline().unwrap();
    let table = pipeline.run_named(school()).unwrap();

    assert_eq!(
        table_to_json(&table),
        json!({
            "header": ["lecturer_name", "lecturer_classes_title", "mean"],
            "rows": [
                {"lecturer_name": "Lee", "lecturer_classes_title": "Math", "mean": 80.0},
                {"lecturer_name": "Lee", "lecturer_classes_title": "Music", "mean": null},
                {"lecturer_name": "Kim", "lecturer_classes_title": "Art", "mean": 60.0}
            ]
        })
    );
}

#[test]
fn test_run_without_rules() {
    let mut root = Extractor::builder();
    root.child("classes", |c| {
        c.capture("title");
    });
    let pipeline = Pipeline::extract_only(root.build().unwrap());
    let table = pipeline.run(Value::Object(school())).unwrap();
    assert_eq!(table.rows.len(), 3);
    assert!(pipeline.mapper().is_empty());
}

#[test]
fn test_merge_visible_to_projection() {
    let mapper = Mapper::builder()
        .merge("classes", "instructors")
        .on("instructor", "id")
        .build()
        .unwrap();
    let mut root = Extractor::builder();
    root.child("classes", |c| {
        c.capture("title");
        c.capture("name").named("lecturer");
    });
    let pipeline = Pipeline::new(mapper, root.build().unwrap());

    let table = pipeline.run_named(school()).unwrap();
    let lecturers: Vec<&Value> = table.rows.iter().map(|r| &r["lecturer"]).collect();
    assert_eq!(
        lecturers,
        vec![&Value::from("Lee"), &Value::from("Kim"), &Value::from("Lee")]
    );
}

// ============================================================================
// Job files
// ============================================================================

#[test]
fn test_job_header_and_using() {
    let job = JobConfig::from_json(
        r#"{
            "extract": {
                "using": "data.rows",
                "header": ["id", "tags"],
                "nodes": [
                    {"capture": "id"},
                    {"capture": "tags", "compose": [{"fn": "sort", "desc": true}, {"fn": "join", "sep": ";"}]}
                ]
            }
        }"#,
    )
    .unwrap();
    let table = job
        .pipeline()
        .unwrap()
        .run(Value::from(json!({"data": {"rows": [{"id": 1, "tags": ["a", "c", "b"]}]}})))
        .unwrap();
    assert_eq!(table.header, vec!["id", "tags"]);
    assert_eq!(table.rows[0]["tags"], Value::from("c;b;a"));
}

#[test]
fn test_job_aggregate_value_and_splat() {
    let job = JobConfig::from_json(
        r#"{
            "extract": {"nodes": [
                {"aggregate": ["a", "b"], "name": "pairs", "compose": [{"fn": "sum"}]},
                {"capture": "c", "splat": true},
                {"key": "d", "children": [{"value": "d"}]},
                {"find": "e.f", "children": [{"capture": "g", "compose": [{"fn": "match", "pattern": "\\d"}]}]}
            ]}
        }"#,
    )
    .unwrap();
    let table = job
        .pipeline()
        .unwrap()
        .run(Value::from(json!({
            "a": [1, 2], "b": [3, 4],
            "c": [true, false],
            "d": "dee",
            "e": {"f": {"g": "x7"}}
        })))
        .unwrap();
    let row = &table.rows[0];
    assert_eq!(row["pairs"], Value::from(json!([4, 6])));
    assert_eq!(row["c[1]"], Value::Boolean(false));
    assert_eq!(row["d"], Value::from("dee"));
    assert_eq!(row["e.f_g"], Value::from("7"));
}

#[test]
fn test_job_errors() {
    assert!(matches!(
        JobConfig::from_json(r#"{"merge": [{"left": "a", "right": "b", "on": []}]}"#)
            .unwrap()
            .pipeline(),
        Err(ConfigError::Build(_))
    ));
    assert!(matches!(
        JobConfig::from_json(r#"{"extract": {"nodes": [{"capture": "a", "children": [{"capture": "b"}]}]}}"#)
            .unwrap()
            .extractor(),
        Err(ConfigError::Node { .. })
    ));
    assert!(matches!(
        JobConfig::from_json(r#"{"extract": {"nodes": [{"capture": "a", "compose": [{"fn": "match", "pattern": "("}]}]}}"#)
            .unwrap()
            .extractor(),
        Err(ConfigError::Build(_))
    ));
    assert!(matches!(
        JobConfig::from_json(r#"{"extract": {"nodes": [{"capture": "a", "compose": [{"fn": "explode"}]}]}}"#),
        Err(ConfigError::Json(_))
    ));
}
