use super::*;

fn survey() -> DataTable {
    DataTable::from_json_str(
        r#"[
            {"age": 34, "sex": "F", "weight": 1.5},
            {"age": 51, "sex": "M"},
            {"age": null, "sex": "F", "weight": 0.5}
        ]"#,
    )
    .unwrap()
}

#[test]
fn records_fill_missing_keys_with_na() {
    let t = survey();
    assert_eq!(t.columns(), &["age", "sex", "weight"]);
    assert_eq!(t.len(), 3);
    let w = t.column_index("weight").unwrap();
    assert!(t.rows()[1][w].is_null());
}

#[test]
fn nested_values_are_rejected() {
    assert!(DataTable::from_json_str(r#"[{"a": [1, 2]}]"#).is_err());
}

#[test]
fn duplicate_columns_are_rejected() {
    assert!(DataTable::new(["a", "a"]).is_err());
}

#[test]
fn push_row_checks_width() {
    let mut t = DataTable::new(["a", "b"]).unwrap();
    assert!(t.push_row(vec![Cell::Null]).is_err());
    t.push_row(vec![Cell::Number(1.0), Cell::Text("x".into())])
        .unwrap();
    assert_eq!(t.len(), 1);
}

#[test]
fn signature_is_stable_and_content_sensitive() {
    let a = survey();
    let b = survey();
    assert_eq!(a.signature(), b.signature());
    assert_eq!(a.signature().len(), 64);

    let mut c = survey();
    c.push_row(vec![Cell::Number(20.0), Cell::Null, Cell::Null])
        .unwrap();
    assert_ne!(a.signature(), c.signature());
}

#[test]
fn cell_views() {
    assert_eq!(Cell::Bool(true).as_f64(), Some(1.0));
    assert_eq!(Cell::Text("x".into()).as_f64(), None);
    assert_eq!(Cell::Number(2.0).label().as_deref(), Some("2"));
    assert_eq!(Cell::Null.label(), None);
}
