use pipes::{
    list_source_references, run_pipeline, ConfigError, DataTable, Engine, ErrorKind,
    EvaluationError, InputTables, ScalarValue, SchemaError,
};
use pipes_types::{EngineConfig, PipeConfigs, WireTable};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};

fn inputs() -> InputTables {
    let wire = |value: JsonValue| {
        DataTable::from_wire(serde_json::from_value::<WireTable>(value).unwrap()).unwrap()
    };
    InputTables::from([
        (
            "sourceId1".to_string(),
            wire(json!({
                "i64": {
                    "year": [2021, 2021, 2022, 2022, 2023, 2023],
                    "month": [1, 2, 2, 3, 3, 4]
                },
                "f64": {
                    "revenue": [100.0, 200.0, 300.0, 400.0, 500.0, 600.0],
                    "cost": [50.0, 100.0, 150.0, 200.0, 250.0, 300.0]
                }
            })),
        ),
        (
            "sourceId2".to_string(),
            wire(json!({
                "i64": {"year": [2020, 2021, 2022]},
                "f64": {"taxRate": [0.05, 0.15, 0.25]}
            })),
        ),
        (
            "grades".to_string(),
            wire(json!({
                "i64": {
                    "semester": (895..915).collect::<Vec<i64>>(),
                    "score": (0..20).map(|i| if i % 5 == 0 { None } else { Some(i) }).collect::<Vec<_>>()
                },
                "str": {"day": (0..20).map(|i| format!("2024-01-{:02}", i + 1)).collect::<Vec<_>>()}
            })),
        ),
    ])
}

fn configs() -> PipeConfigs {
    serde_json::from_value(json!({
        "source1": {"type": "Source", "sourceId": "sourceId1"},
        "source2": {"type": "Source", "sourceId": "sourceId2"},
        "grades": {"type": "Source", "sourceId": "grades"},
        "joinLeft1": {"type": "Join", "leftPipeId": "source1", "rightPipeId": "source2", "on": ["year"], "how": "Left"},
        "joinInner1": {"type": "Join", "leftPipeId": "source1", "rightPipeId": "source2", "on": ["year"], "how": "Inner"},
        "joinRight1": {"type": "Join", "leftPipeId": "source1", "rightPipeId": "source2", "on": ["year"], "how": "Right"},
        "joinOuter1": {"type": "Join", "leftPipeId": "source1", "rightPipeId": "source2", "on": ["year"], "how": "Outer"},
        "addPipe1": {"type": "DerivedValues", "pipeId": "source1", "calcs": [{
            "name": "newValue",
            "expression": {"operation": "Sum", "operands": [{"property": "revenue"}, {"property": "cost"}, 1]}
        }]},
        "multiplyPipe1": {"type": "DerivedValues", "pipeId": "source1", "calcs": [{
            "name": "newValue",
            "expression": {"operation": "Multiply", "operands": [{"property": "revenue"}, {"property": "cost"}, -1]}
        }]},
        "taxes": {"type": "DerivedValues", "pipeId": "joinLeft1", "calcs": [
            {"name": "tax", "expression": {"operation": "Multiply", "operands": [{"property": "revenue"}, {"property": "taxRate"}]}},
            {"name": "yearlyRevenue", "expression": {"operation": "Sum", "operand": {"property": "revenue"}, "over": ["year"]}},
            {"name": "bracket", "expression": {"operation": "IfThenElse", "operands": [
                {"operation": "GreaterThan", "operands": [{"property": "revenue"}, 350]}, "high",
                "low"
            ]}}
        ]},
        "taxByYear": {"type": "GroupAndReduce", "pipeId": "taxes", "groupBy": ["year"], "aggs": [
            {"name": "totalTax", "type": "Sum", "aggProperty": "tax"},
            {"name": "maxRevenue", "type": "Max", "aggProperty": "revenue"}
        ]},
        "semesters": {"type": "Filter", "pipeId": "grades", "filters": [
            {"operation": "GreaterThan", "operands": [{"property": "semester"}, 900]},
            {"operation": "LessThan", "operands": [{"property": "semester"}, 910]}
        ]},
        "renamed": {"type": "Rename", "pipeId": "grades", "properties": {"from": "semester", "to": "term"}},
        "filterNew": {"type": "Filter", "pipeId": "renamed", "filters": [
            {"operation": "GreaterThanEq", "operands": [{"property": "term"}, 910]}
        ]},
        "filterOld": {"type": "Filter", "pipeId": "renamed", "filters": [
            {"operation": "GreaterThanEq", "operands": [{"property": "semester"}, 910]}
        ]},
        "dates": {"type": "ParseDateTime", "pipeId": "grades", "columnFrom": "day", "columnTo": "date", "format": "%Y-%m-%d"}
    }))
    .unwrap()
}

/// Rows of `table` as `column -> value` JSON objects, nulls included.
fn records(table: &DataTable) -> Vec<JsonValue> {
    (0..table.num_rows())
        .map(|row| {
            let record = table
                .column_names()
                .zip(table.row(row))
                .map(|(name, value)| {
                    let value = match value {
                        ScalarValue::Null => JsonValue::Null,
                        ScalarValue::Float64(v) => json!(v),
                        ScalarValue::Int64(v) | ScalarValue::DateTime(v) => json!(v),
                        ScalarValue::String(v) => json!(v.as_str()),
                        ScalarValue::Bool(v) => json!(v),
                    };
                    (name.to_string(), value)
                })
                .collect::<serde_json::Map<_, _>>();
            JsonValue::Object(record)
        })
        .collect()
}

fn run(output: &str) -> DataTable {
    let tables = run_pipeline(&[output], &inputs(), &configs()).unwrap();
    tables[output].as_ref().clone()
}

fn sales_row(year: i64, month: i64, revenue: f64, tax_rate: Option<f64>) -> JsonValue {
    json!({"year": year, "month": month, "revenue": revenue, "cost": revenue / 2.0, "taxRate": tax_rate})
}

#[test]
fn left_join() {
    assert_eq!(
        records(&run("joinLeft1")),
        vec![
            sales_row(2021, 1, 100.0, Some(0.15)),
            sales_row(2021, 2, 200.0, Some(0.15)),
            sales_row(2022, 2, 300.0, Some(0.25)),
            sales_row(2022, 3, 400.0, Some(0.25)),
            sales_row(2023, 3, 500.0, None),
            sales_row(2023, 4, 600.0, None),
        ]
    );
}

#[test]
fn inner_join() {
    assert_eq!(
        records(&run("joinInner1")),
        vec![
            sales_row(2021, 1, 100.0, Some(0.15)),
            sales_row(2021, 2, 200.0, Some(0.15)),
            sales_row(2022, 2, 300.0, Some(0.25)),
            sales_row(2022, 3, 400.0, Some(0.25)),
        ]
    );
}

#[test]
fn right_join() {
    let unmatched =
        json!({"year": 2020, "month": null, "revenue": null, "cost": null, "taxRate": 0.05});
    assert_eq!(
        records(&run("joinRight1")),
        vec![
            unmatched,
            sales_row(2021, 1, 100.0, Some(0.15)),
            sales_row(2021, 2, 200.0, Some(0.15)),
            sales_row(2022, 2, 300.0, Some(0.25)),
            sales_row(2022, 3, 400.0, Some(0.25)),
        ]
    );
}

#[test]
fn outer_join() {
    let table = run("joinOuter1");
    let mut expected = records(&run("joinLeft1"));
    expected.push(json!({"year": 2020, "month": null, "revenue": null, "cost": null, "taxRate": 0.05}));
    assert_eq!(table.num_rows(), 7);
    assert_eq!(records(&table), expected);
}

#[test]
fn derived_values() {
    let new_values = |output: &str| -> Vec<ScalarValue> {
        let table = run(output);
        (0..table.num_rows())
            .map(|row| table.value(row, "newValue").unwrap())
            .collect()
    };
    assert_eq!(
        new_values("addPipe1"),
        [151.0, 301.0, 451.0, 601.0, 751.0, 901.0].map(ScalarValue::Float64)
    );
    assert_eq!(
        new_values("multiplyPipe1"),
        [-5_000.0, -20_000.0, -45_000.0, -80_000.0, -125_000.0, -180_000.0].map(ScalarValue::Float64)
    );
}

#[test]
fn window_conditional_and_group() {
    let taxes = run("taxes");
    assert_eq!(
        taxes.column_names().collect::<Vec<_>>(),
        vec!["revenue", "cost", "year", "month", "taxRate", "tax", "yearlyRevenue", "bracket"]
    );
    assert_eq!(
        (0..6)
            .map(|row| taxes.value(row, "yearlyRevenue").unwrap())
            .collect::<Vec<_>>(),
        [300.0, 300.0, 700.0, 700.0, 1100.0, 1100.0].map(ScalarValue::Float64)
    );
    assert_eq!(
        (0..6)
            .map(|row| taxes.value(row, "bracket").unwrap().to_string())
            .collect::<Vec<_>>(),
        vec!["\"low\"", "\"low\"", "\"low\"", "\"high\"", "\"high\"", "\"high\""]
    );

    let configs = configs();
    let referenced: Vec<Vec<&str>> = configs["taxes"]
        .expressions()
        .iter()
        .map(|expression| expression.referenced_columns())
        .collect();
    assert_eq!(
        referenced,
        vec![vec!["revenue", "taxRate"], vec!["year", "revenue"], vec!["revenue"]]
    );
    let joined = run("joinLeft1");
    assert!(referenced.iter().flatten().all(|column| joined.contains(column)));

    let records = records(&run("taxByYear"));
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["year"], json!(2021));
    assert!((records[0]["totalTax"].as_f64().unwrap() - 45.0).abs() < 1e-9);
    assert_eq!(records[2], json!({"year": 2023, "totalTax": null, "maxRevenue": 600.0}));
}

#[test]
fn filter_conjunction() {
    let table = run("semesters");
    assert_eq!(
        (0..table.num_rows())
            .map(|row| table.value(row, "semester").unwrap())
            .collect::<Vec<_>>(),
        (901..910).map(ScalarValue::Int64).collect::<Vec<_>>()
    );
}

#[test]
fn rename_then_filter() {
    let table = run("filterNew");
    assert_eq!(table.num_rows(), 5);
    assert!(table.contains("term"));
    assert!(!table.contains("semester"));

    let err = run_pipeline(&["filterOld"], &inputs(), &configs()).unwrap_err();
    assert_eq!(err.pipe_id.as_deref(), Some("filterOld"));
    assert_eq!(
        err.kind,
        ErrorKind::Schema(SchemaError::MissingColumn {
            column: "semester".to_string()
        })
    );
}

#[test]
fn parse_dates() {
    let table = run("dates");
    assert_eq!(table.value(0, "date").unwrap(), ScalarValue::DateTime(1_704_067_200_000));
    assert_eq!(table.value(1, "date").unwrap(), ScalarValue::DateTime(1_704_153_600_000));
}

#[test]
fn outputs_in_request_order() {
    let tables = run_pipeline(&["semesters", "joinInner1", "source2"], &inputs(), &configs()).unwrap();
    assert_eq!(
        tables.keys().collect::<Vec<_>>(),
        vec!["semesters", "joinInner1", "source2"]
    );
    assert_eq!(tables["source2"].num_rows(), 3);
}

#[test]
fn request_errors() {
    let err = run_pipeline(&["nope"], &inputs(), &configs()).unwrap_err();
    assert!(err.is_config_error());
    assert_eq!(err.pipe_id, None);

    let mut missing_source = inputs();
    missing_source.remove("sourceId2");
    let err = run_pipeline(&["joinLeft1"], &missing_source, &configs()).unwrap_err();
    assert_eq!(err.pipe_id.as_deref(), Some("source2"));
    assert_eq!(
        err.kind,
        ErrorKind::Config(ConfigError::UnknownSourceId {
            source_id: "sourceId2".to_string()
        })
    );

    // Unrelated pipes are neither validated nor evaluated.
    let tables = run_pipeline(&["addPipe1"], &missing_source, &configs()).unwrap();
    assert_eq!(tables["addPipe1"].num_rows(), 6);
}

#[test]
fn arity_checked_before_evaluation() {
    let mut configs = configs();
    configs.insert(
        "broken".to_string(),
        serde_json::from_value(json!({"type": "Filter", "pipeId": "grades", "filters": [
            {"operation": "Not", "operands": [true, false]}
        ]}))
        .unwrap(),
    );
    for validate_expressions in [true, false] {
        let engine = Engine::new(EngineConfig {
            validate_expressions,
            ..EngineConfig::default()
        });
        let err = engine.run_one("broken", &inputs(), &configs).unwrap_err();
        assert_eq!(err.pipe_id.as_deref(), Some("broken"));
        assert!(err.is_evaluation_error());
        assert!(matches!(
            err.kind,
            ErrorKind::Evaluation(EvaluationError::Arity { actual: 2, .. })
        ));
    }
}

#[test]
fn parallel_runs_match_sequential() {
    let outputs = [
        "joinLeft1",
        "joinInner1",
        "joinRight1",
        "joinOuter1",
        "addPipe1",
        "multiplyPipe1",
        "taxByYear",
        "semesters",
        "filterNew",
        "dates",
    ];
    let sequential = run_pipeline(&outputs, &inputs(), &configs()).unwrap();
    for workers in [2, 3, 8] {
        let engine = Engine::new(EngineConfig {
            workers,
            ..EngineConfig::default()
        });
        for _ in 0..3 {
            let parallel = engine.run(&outputs, &inputs(), &configs()).unwrap();
            assert_eq!(parallel, sequential);
        }
    }

    let engine = Engine::new(EngineConfig {
        workers: 4,
        ..EngineConfig::default()
    });
    let err = engine
        .run(&["filterOld", "joinLeft1"], &inputs(), &configs())
        .unwrap_err();
    assert_eq!(err.pipe_id.as_deref(), Some("filterOld"));
}

#[test]
fn parallel_failure_across_waves_matches_sequential() {
    // Topological order is grades, passThrough, late, early, but `early`
    // runs one wave before `late`.
    let configs: PipeConfigs = serde_json::from_value(json!({
        "grades": {"type": "Source", "sourceId": "grades"},
        "passThrough": {"type": "Filter", "pipeId": "grades", "filters": []},
        "late": {"type": "Filter", "pipeId": "passThrough", "filters": [{"property": "missingLate"}]},
        "early": {"type": "Filter", "pipeId": "grades", "filters": [{"property": "missingEarly"}]}
    }))
    .unwrap();
    let outputs = ["late", "early"];

    let sequential = run_pipeline(&outputs, &inputs(), &configs).unwrap_err();
    assert_eq!(sequential.pipe_id.as_deref(), Some("late"));
    assert!(sequential.is_schema_error());
    for workers in [2, 4] {
        let engine = Engine::new(EngineConfig {
            workers,
            ..EngineConfig::default()
        });
        assert_eq!(engine.run(&outputs, &inputs(), &configs).unwrap_err(), sequential);
    }
}

#[test]
fn source_references() {
    assert_eq!(
        list_source_references(&configs()),
        vec![
            ("source1".to_string(), "sourceId1".to_string()),
            ("source2".to_string(), "sourceId2".to_string()),
            ("grades".to_string(), "grades".to_string()),
        ]
    );
}
