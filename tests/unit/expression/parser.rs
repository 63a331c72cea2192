use super::*;
use crate::expression::ast::Expr;

#[test]
fn parses_arithmetic_precedence() {
    let e = parse_expr("1+2*3").unwrap();
    match e {
        Expr::Binary {
            op: BinaryOp::Add, ..
        } => {}
        other => panic!("unexpected ast: {other:?}"),
    }
}

#[test]
fn and_binds_tighter_than_or() {
    let e = parse_expr("a == 1 || b == 2 && c == 3").unwrap();
    match e {
        Expr::Binary {
            op: BinaryOp::Or,
            right,
            ..
        } => assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::And,
                ..
            }
        )),
        other => panic!("unexpected ast: {other:?}"),
    }
}

#[test]
fn parses_columns_strings_and_r_style_operators() {
    let e = parse_expr("sex == 'F' & `household size` > 2").unwrap();
    assert_eq!(e.columns(), vec!["sex", "household size"]);
}

#[test]
fn parses_calls() {
    let e = parse_expr("in(region, \"north\", \"south\")").unwrap();
    match e {
        Expr::Call { func, args } => {
            assert_eq!(func, Func::In);
            assert_eq!(args.len(), 3);
        }
        other => panic!("unexpected ast: {other:?}"),
    }
}

#[test]
fn rejects_unknown_functions_and_bad_arity() {
    assert!(parse_expr("mean(x)").is_err());
    assert!(parse_expr("is_na(a, b)").is_err());
    assert!(parse_expr("in(a)").is_err());
}

#[test]
fn rejects_empty_and_trailing_input() {
    assert!(parse_expr("   ").is_err());
    assert!(parse_expr("a > 1 )").is_err());
    assert!(parse_expr("'open").is_err());
}

#[test]
fn dotted_identifiers_are_single_columns() {
    assert_eq!(parse_expr("q1.a").unwrap(), Expr::Column("q1.a".to_owned()));
}

#[test]
fn accepts_non_ascii_column_names() {
    let e = parse_expr("is_na(été)").unwrap();
    assert_eq!(e.columns(), vec!["été"]);
    let e = parse_expr("(größe<=3)&&ville=='Zürich'").unwrap();
    assert_eq!(e.columns(), vec!["größe", "ville"]);
    assert!(parse_expr("a <€ 3").is_err());
}
