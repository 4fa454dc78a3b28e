use defect_judge::judge::Reason;
use defect_judge::service;
use defect_judge::{
    DefectCondition, DefectType, EngineConfig, MeasurementBag, MeasurementValue, SpecTables,
    Verdict, judge, judge_defect_type,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn load(value: Value) -> DefectCondition {
    DefectCondition::from_json(&value.to_string(), &EngineConfig::default()).unwrap()
}

fn bag(values: &[(&str, f64)]) -> MeasurementBag {
    values
        .iter()
        .map(|&(name, v)| MeasurementValue::new(name, v))
        .collect()
}

fn longest_at_least_15() -> Value {
    json!({
        "id": 1,
        "no_measurement_default_result": "OK",
        "measurement_conditions": [{
            "id": 10, "measurement_name": "longest", "default_result_value": "OK",
            "root_logical_operator": "AND",
            "specifications": [{ "id": 100, "expressions": [{ "value": 15, "inequality_sign": ">=" }] }]
        }]
    })
}

#[test]
fn reading_inside_the_defect_range_is_ng() {
    let dc = load(longest_at_least_15());
    let j = judge(&dc, &bag(&[("longest", 20.0)]), &EngineConfig::default());
    assert_eq!(j.verdict, Verdict::Ng);
    assert_eq!(j.decided_by, Some(10));
    assert_eq!(
        j.trace[0].reason,
        Reason::Matched {
            value: 20.0,
            path: vec![100]
        }
    );
}

#[test]
fn reading_outside_the_defect_range_is_ok() {
    let dc = load(longest_at_least_15());
    let j = judge(&dc, &bag(&[("longest", 10.0)]), &EngineConfig::default());
    assert_eq!(j.verdict, Verdict::Ok);
    assert_eq!(j.decided_by, None);
}

#[test]
fn missing_measurement_uses_the_condition_default() {
    let dc = load(longest_at_least_15());
    let j = judge(&dc, &bag(&[("area", 300.0)]), &EngineConfig::default());
    assert_eq!(j.verdict, Verdict::Ok);
    assert_eq!(
        j.trace[0].reason,
        Reason::MeasurementMissing {
            measurement: "longest".to_string()
        }
    );
}

#[test]
fn second_condition_decides_ng() {
    let dc = load(json!({
        "id": 1,
        "no_measurement_default_result": "OK",
        "measurement_conditions": [
            { "id": 10, "idx": 1, "measurement_name": "longest", "default_result_value": "OK",
              "specifications": [{ "expressions": [{ "value": 15, "inequality_sign": ">=" }] }] },
            { "id": 20, "idx": 2, "measurement_name": "area", "default_result_value": "OK",
              "specifications": [{ "expressions": [{ "value": 100, "inequality_sign": ">" }] }] }
        ]
    }));
    let j = judge(
        &dc,
        &bag(&[("longest", 5.0), ("area", 150.0)]),
        &EngineConfig::default(),
    );
    assert_eq!(j.verdict, Verdict::Ng);
    assert_eq!(j.decided_by, Some(20));
    assert_eq!(j.trace.len(), 2);
    assert_eq!(j.trace[0].verdict, Verdict::Ok);
    assert_eq!(j.deciding_entry().map(|e| e.measurement_condition_id), Some(Some(20)));
}

#[test]
fn no_conditions_and_no_measurements_returns_the_defect_default() {
    let dc = load(json!({ "id": 3, "no_measurement_default_result": "NG", "measurement_conditions": [] }));
    let j = judge(&dc, &MeasurementBag::default(), &EngineConfig::default());
    assert_eq!(j.verdict, Verdict::Ng);
    assert_eq!(j.trace.len(), 1);
    assert_eq!(j.trace[0].reason, Reason::NoMeasurements);
}

#[test]
fn or_of_outer_ranges_matches_the_high_branch() {
    let dc = load(json!({
        "id": 1,
        "no_measurement_default_result": "OK",
        "measurement_conditions": [{
            "id": 10, "measurement_name": "area", "default_result_value": "OK",
            "root_logical_operator": "AND",
            "specifications": [{
                "id": 100, "sub_logical_operator": "OR",
                "sub_specifications": [
                    { "id": 101, "expressions": [{ "value": 250, "inequality_sign": ">=" }] },
                    { "id": 102, "expressions": [{ "value": 50, "inequality_sign": "<=" }] }
                ]
            }]
        }]
    }));
    let cfg = EngineConfig::default();
    let j = judge(&dc, &bag(&[("area", 300.0)]), &cfg);
    assert_eq!(j.verdict, Verdict::Ng);
    assert_eq!(
        j.trace[0].reason,
        Reason::Matched {
            value: 300.0,
            path: vec![100, 101]
        }
    );
    assert_eq!(judge(&dc, &bag(&[("area", 120.0)]), &cfg).verdict, Verdict::Ok);
    assert_eq!(judge(&dc, &bag(&[("area", 20.0)]), &cfg).verdict, Verdict::Ng);
}

#[test]
fn stored_key_names_and_tokens_load() {
    let dc = load(json!({
        "id": 1,
        "no_measurement_default_result": "AI_OK",
        "MeasurementConditions": [{
            "id": 10, "measurement_name": "area", "default_result_value": "AI_UNKNOWN_NONE",
            "root_logical_operator": "None",
            "Specifications": [{
                "id": 100, "sub_logical_operator": "OR",
                "SubSpecifications": [
                    { "id": 101, "Expression": [{ "threshold": 250, "sign": "gte" }] },
                    { "id": 102, "Expression": [{ "threshold": 50, "sign": "lte" }] }
                ]
            }]
        }]
    }));
    assert!(dc.issues().is_empty());
    let cfg = EngineConfig::default();
    assert_eq!(judge(&dc, &bag(&[("area", 40.0)]), &cfg).verdict, Verdict::Ng);
    assert_eq!(judge(&dc, &bag(&[("thick", 1.0)]), &cfg).verdict, Verdict::Indeterminate);
}

#[test]
fn relational_rows_round_trip_through_nested_form() {
    let raw = serde_json::from_value(longest_at_least_15()).unwrap();
    let tables = SpecTables::flatten(&raw).unwrap();
    let rebuilt = tables.assemble(1, 32).unwrap();
    assert_eq!(rebuilt.measurement_conditions[0].specifications[0].id, Some(100));
    assert_eq!(SpecTables::flatten(&rebuilt).unwrap(), tables);

    let cfg = EngineConfig::default();
    let dc = DefectCondition::from_tables(&tables, 1, &cfg).unwrap();
    assert_eq!(judge(&dc, &bag(&[("longest", 15.0)]), &cfg).verdict, Verdict::Ng);
}

#[test]
fn cyclic_rows_fail_closed() {
    let tables: SpecTables = serde_json::from_value(json!({
        "defect_conditions": [{ "id": 1, "idx": 0, "no_measurement_default_result": "OK" }],
        "measurement_conditions": [{
            "id": 10, "defect_condition_id": 1, "idx": 0, "measurement_name": "area",
            "default_result_value": "OK", "root_logical_operator": "AND"
        }],
        "specifications": [
            { "id": 100, "measurement_condition_id": 10, "parent_spec_id": null, "sub_logical_operator": "OR" },
            { "id": 101, "measurement_condition_id": 10, "parent_spec_id": 102, "sub_logical_operator": "OR" },
            { "id": 102, "measurement_condition_id": 10, "parent_spec_id": 101, "sub_logical_operator": "OR" }
        ],
        "expressions": [
            { "id": 1, "specification_id": 100, "value": 1000, "inequality_sign": ">" },
            { "id": 2, "specification_id": 101, "value": 0, "inequality_sign": ">" }
        ]
    }))
    .unwrap();
    let cfg = EngineConfig::default();
    let dc = DefectCondition::from_tables(&tables, 1, &cfg).unwrap();
    assert!(!dc.issues().is_empty());

    let j = judge(&dc, &bag(&[("area", 5.0)]), &cfg);
    assert_eq!(j.verdict, Verdict::Ng);
    assert!(matches!(j.trace[0].reason, Reason::Malformed { .. }));

    // Measurement absence still wins over a broken rule.
    let j = judge(&dc, &bag(&[("longest", 5.0)]), &cfg);
    assert_eq!(j.verdict, Verdict::Ok);
}

#[test]
fn defect_type_picks_the_machine_condition() {
    let dt = DefectType::from_json(
        &json!({
            "ai_code": "SCR",
            "defect_name": "scratch",
            "DefectConditions": [
                { "id": 1, "idx": 0, "machine_type": "None", "no_measurement_default_result": "OK",
                  "measurement_conditions": [{ "id": 10, "measurement_name": "longest", "default_result_value": "OK",
                    "specifications": [{ "expressions": [{ "value": 50, "inequality_sign": ">=" }] }] }] },
                { "id": 2, "idx": 1, "machine_type": "AOI-7", "no_measurement_default_result": "OK",
                  "measurement_conditions": [{ "id": 20, "measurement_name": "longest", "default_result_value": "OK",
                    "specifications": [{ "expressions": [{ "value": 15, "inequality_sign": ">=" }] }] }] }
            ]
        })
        .to_string(),
        &EngineConfig::default(),
    )
    .unwrap();
    let cfg = EngineConfig::default();
    let readings = bag(&[("longest", 20.0)]);

    let j = judge_defect_type(&dt, "AOI-7", &readings, &cfg);
    assert_eq!((j.verdict, j.defect_condition_id), (Verdict::Ng, Some(2)));

    let j = judge_defect_type(&dt, "AOI-3", &readings, &cfg);
    assert_eq!((j.verdict, j.defect_condition_id), (Verdict::Ok, Some(1)));
}

#[test]
fn service_answers_with_a_trace() {
    let request = json!({
        "defect_condition": longest_at_least_15(),
        "measurements": [{ "name": "longest", "value": null }, { "name": "area", "value": 3 }]
    });
    let resp = service::handle_request(&request.to_string(), &EngineConfig::default()).unwrap();
    assert_eq!(resp.verdict, Verdict::Ok);
    assert_eq!(
        serde_json::to_value(&resp).unwrap(),
        json!({
            "verdict": "OK",
            "decided_by": null,
            "trace": [{
                "measurement_condition_id": 10,
                "verdict": "OK",
                "reason": { "kind": "measurement_missing", "measurement": "longest" }
            }]
        })
    );
}
