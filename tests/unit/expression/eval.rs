use super::*;
use crate::expression::parser::parse_expr;

fn table() -> DataTable {
    DataTable::from_json_str(
        r#"[
            {"age": 34, "sex": "F", "region": "north"},
            {"age": 51, "sex": "M", "region": "south"},
            {"age": null, "sex": "F", "region": "east"},
            {"age": 19, "sex": null, "region": "north"}
        ]"#,
    )
    .unwrap()
}

fn mask(src: &str) -> VizResult<Vec<bool>> {
    let expr = parse_expr(src).unwrap();
    eval_mask(&expr, &table(), src)
}

#[test]
fn comparisons_drop_na_rows() {
    assert_eq!(mask("age > 30").unwrap(), vec![true, true, false, false]);
}

#[test]
fn kleene_logic_keeps_definite_answers() {
    // NA || true is true; NA && false is false.
    assert_eq!(
        mask("age > 30 || sex == 'F'").unwrap(),
        vec![true, true, true, false]
    );
    assert_eq!(
        mask("age > 100 && sex == 'F'").unwrap(),
        vec![false, false, false, false]
    );
}

#[test]
fn functions() {
    assert_eq!(mask("is_na(age)").unwrap(), vec![false, false, true, false]);
    assert_eq!(
        mask("in(region, 'north', 'east')").unwrap(),
        vec![true, false, true, true]
    );
    assert_eq!(mask("!is_na(sex)").unwrap(), vec![true, true, true, false]);
}

#[test]
fn arithmetic_inside_comparisons() {
    assert_eq!(mask("age * 2 >= 68").unwrap(), vec![true, true, false, false]);
}

#[test]
fn unknown_column_is_a_binding_error_with_expression_text() {
    let err = mask("income > 10").unwrap_err();
    match err {
        VizError::DataBinding { expr, message } => {
            assert_eq!(expr, "income > 10");
            assert!(message.contains("income"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_logical_result_is_rejected() {
    assert!(matches!(
        mask("age + 1").unwrap_err(),
        VizError::DataBinding { .. }
    ));
}

#[test]
fn ordering_text_against_number_is_rejected() {
    assert!(mask("sex > 3").is_err());
}
