//! Cross-module tests over JSON-shaped records.

use lexia_seeker::{
    FilterOp, FilterSpec, Number, Operand, OrderBy, Query, Record, Scalar, Seekable, SortOrder,
    Timestamp, Value,
};
use serde_json::json;

// ============================================================================
// Value type coverage
// ============================================================================

#[test]
fn value_as_extractors() {
    assert_eq!(Value::String("hello").as_str(), Some("hello"));
    assert_eq!(Value::String("hello").as_number(), None);
    assert_eq!(
        Value::Number(Number::I64(42)).as_number(),
        Some(Number::I64(42))
    );
    assert_eq!(
        Value::Timestamp(Timestamp(1000)).as_timestamp(),
        Some(Timestamp(1000))
    );
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::None.as_str(), None);
    assert_eq!(Value::None.as_bool(), None);
}

#[test]
fn number_from_conversions() {
    let _: Number = 42i8.into();
    let _: Number = 42i32.into();
    let _: Number = 42u64.into();
    let _: Number = 42f32.into();
    let _: Number = 42usize.into();
    assert_eq!(Number::U64(42).to_f64(), 42.0);
}

// ============================================================================
// Operator coverage
// ============================================================================

#[test]
fn operator_names_round_trip() {
    let all = [
        FilterOp::Equals,
        FilterOp::Contains,
        FilterOp::StartsWith,
        FilterOp::EndsWith,
        FilterOp::GreaterThan,
        FilterOp::GreaterOrEqual,
        FilterOp::LessThan,
        FilterOp::LessOrEqual,
        FilterOp::Between,
    ];
    for op in all {
        assert_eq!(FilterOp::parse(op.as_str()), op);
    }
}

// ============================================================================
// Ordering coverage
// ============================================================================

#[test]
fn sort_order_checks() {
    assert!(SortOrder::Asc.is_asc());
    assert!(SortOrder::Desc.is_desc());
    assert_eq!(SortOrder::default(), SortOrder::Asc);
    assert_eq!(serde_json::to_value(SortOrder::Desc).unwrap(), json!("desc"));
}

#[test]
fn order_by_compare_with_none() {
    let order = OrderBy::asc("field");
    let a = Value::String("test");
    let b = Value::None;

    assert_eq!(order.compare(&a, &b), std::cmp::Ordering::Less);
    assert_eq!(order.compare(&b, &a), std::cmp::Ordering::Greater);
}

// ============================================================================
// Scalar conversions
// ============================================================================

#[test]
fn scalar_from_conversions() {
    assert_eq!(Scalar::from("x"), Scalar::String("x".into()));
    assert_eq!(Scalar::from(String::from("x")), Scalar::String("x".into()));
    assert_eq!(Scalar::from(3u8), Scalar::Number(Number::U64(3)));
    assert_eq!(Scalar::from(true), Scalar::Bool(true));
    assert_eq!(
        Scalar::from(Timestamp(5)),
        Scalar::Timestamp(Timestamp(5))
    );
}

// ============================================================================
// Queries over JSON records
// ============================================================================

fn solicitudes() -> Vec<Record> {
    Record::list_from_json(json!([
        {
            "id": 1,
            "alias": "Banco Popular",
            "frecuencia_envio": "diaria",
            "activa": true,
            "meta": { "despacho": "Juzgado 01 Civil", "ejecuciones": 12 }
        },
        {
            "id": 2,
            "alias": "Ávila vs Pérez",
            "frecuencia_envio": "semanal",
            "activa": false,
            "meta": { "despacho": "Juzgado 03 Laboral", "ejecuciones": 3 }
        },
        {
            "id": 3,
            "alias": "avila hermanos",
            "frecuencia_envio": "mensual",
            "activa": true,
            "meta": null
        },
        {
            "id": 4,
            "alias": "Constructora Andina",
            "frecuencia_envio": "diaria",
            "activa": true,
            "meta": { "despacho": "Juzgado 01 Civil", "ejecuciones": 7 }
        }
    ]))
    .unwrap()
}

fn ids(rows: &[&Record]) -> Vec<String> {
    rows.iter().filter_map(|r| r.seeker_id()).collect()
}

#[test]
fn nested_paths_filter_and_sort() {
    let rows = solicitudes();
    let q = Query::new()
        .and_contains("meta.despacho", "civil")
        .order_desc("meta.ejecuciones")
        .build();
    assert_eq!(ids(&q.filter(&rows)), vec!["1", "4"]);
}

#[test]
fn missing_nested_segments_sort_last() {
    let rows = solicitudes();
    let q = Query::new().order_asc("meta.ejecuciones").build();
    assert_eq!(ids(&q.filter(&rows)), vec!["2", "4", "1", "3"]);

    let q = Query::new().order_desc("meta.ejecuciones").build();
    assert_eq!(ids(&q.filter(&rows)), vec!["3", "1", "4", "2"]);
}

#[test]
fn accents_fold_when_sorting() {
    let rows = solicitudes();
    let q = Query::new().order_asc("alias").build();
    assert_eq!(ids(&q.filter(&rows)), vec!["3", "2", "1", "4"]);
}

#[test]
fn json_filter_specs_drive_queries() {
    let rows = solicitudes();
    let spec = FilterSpec::from_json("frecuencia_envio", &json!(["diaria", "mensual"])).unwrap();
    let q = Query::new()
        .and("frecuencia_envio", spec)
        .and_eq("activa", true)
        .build();
    assert_eq!(q.count(&rows), 3);

    let spec =
        FilterSpec::from_json("meta.ejecuciones", &json!({"operator": "gte", "value": "7"}))
            .unwrap();
    let q = Query::new().and("meta.ejecuciones", spec).build();
    assert_eq!(ids(&q.filter(&rows)), vec!["1", "4"]);
}

#[test]
fn strict_equality_distinguishes_kinds() {
    let rows = solicitudes();
    assert_eq!(Query::new().and_eq("id", "1").build().count(&rows), 0);
    assert_eq!(Query::new().and_eq("id", 1).build().count(&rows), 1);
}

#[test]
fn dates_sort_by_instant() {
    let mut rows = Record::list_from_json(json!([
        { "id": "a", "fecha": "2025-05-24T08:15:00+05:00" },
        { "id": "b", "fecha": "2025-05-24T01:00:00Z" },
        { "id": "c" }
    ]))
    .unwrap();
    for row in &mut rows {
        row.parse_date("fecha");
    }
    let q = Query::new().order_asc("fecha").build();
    // 08:15+05:00 is 03:15Z, later than 01:00Z
    assert_eq!(ids(&q.filter(&rows)), vec!["b", "a", "c"]);
}

#[test]
fn operator_with_wrong_operand_shape_matches_nothing() {
    let rows = solicitudes();
    let spec = FilterSpec::Op {
        op: FilterOp::Contains,
        operand: Operand::Many(vec![Scalar::from("a")]),
    };
    assert_eq!(Query::new().and("alias", spec).build().count(&rows), 0);
}
